use anchored_selection_config::IndicatorConfig;
use anchored_selection_engine::{BufferId, Motion, View, ViewId, Workspace};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::indicator::StatusIndicator;

const SCRATCH_TEXT: &str = "Scratch buffer\n\nAnchors are kept per buffer: press F2 again to go back.\n";

/// Two panes showing one document, each with its own anchor
pub struct App {
    workspace: Workspace,
    panes: [ViewId; 2],
    active: usize,
    document: BufferId,
    scratch: BufferId,
    indicator: StatusIndicator,
    clipboard: Option<String>,
    message: Option<String>,
}

impl App {
    pub fn new(name: &str, text: &str, indicator: IndicatorConfig) -> Result<Self> {
        let indicator = StatusIndicator::new(indicator);
        let mut workspace = Workspace::new();
        workspace.add_observer(indicator.observer());

        let document = workspace.open_buffer(name, text);
        let scratch = workspace.open_buffer("scratch", SCRATCH_TEXT);
        let panes = [
            workspace.open_view(document)?,
            workspace.open_view(document)?,
        ];

        Ok(Self {
            workspace,
            panes,
            active: 0,
            document,
            scratch,
            indicator,
            clipboard: None,
            message: None,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn panes(&self) -> [ViewId; 2] {
        self.panes
    }

    pub fn active_view(&self) -> ViewId {
        self.panes[self.active]
    }

    /// View of the focused pane
    pub fn active(&self) -> &View {
        &self.workspace.views()[self.active]
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Handle one key press; returns `false` when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(true);
        }
        self.message = None;
        let view = self.active_view();
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('q') if control => return Ok(false),
            KeyCode::Char(' ') if control => {
                let anchored = self.workspace.toggle_anchor(view)?;
                log::info!("Anchored selection {} in {view}", on_off(anchored));
            }
            KeyCode::Char('c') if control => self.copy()?,
            KeyCode::Esc => {
                if self.workspace.is_anchored(view)? {
                    self.workspace.end_anchor(view)?;
                }
            }
            KeyCode::Tab => {
                self.active = 1 - self.active;
                self.workspace.focus(self.active_view())?;
            }
            KeyCode::F(2) => self.switch_buffer()?,
            KeyCode::Backspace => self.workspace.backspace(view)?,
            KeyCode::Delete => self.workspace.delete_forward(view)?,
            KeyCode::Enter => self.workspace.insert(view, "\n")?,
            KeyCode::Char(c) if !control => {
                let mut encoded = [0; 4];
                self.workspace.insert(view, c.encode_utf8(&mut encoded))?;
            }
            code => {
                if let Some(motion) = motion_for(code, control) {
                    if shift {
                        self.workspace.extend_selection_by(view, motion)?;
                    } else {
                        self.workspace.move_caret_by(view, motion)?;
                    }
                }
            }
        }
        Ok(true)
    }

    /// Copy the selection; leaves anchored mode first, keeping the selection
    fn copy(&mut self) -> Result<()> {
        let view = self.active_view();
        if self.workspace.is_anchored(view)? {
            self.workspace.end_anchor(view)?;
        }
        match self.workspace.view(view)?.selected_text() {
            Some(text) => {
                self.message = Some(format!("Copied {} characters", text.chars().count()));
                self.clipboard = Some(text);
            }
            None => self.message = Some("Nothing selected".to_string()),
        }
        Ok(())
    }

    fn switch_buffer(&mut self) -> Result<()> {
        let view = self.active_view();
        let target = if self.workspace.view(view)?.buffer_id() == self.document {
            self.scratch
        } else {
            self.document
        };
        self.workspace.switch_buffer(view, target)?;
        let name = self.workspace.buffer(target)?.name().to_string();
        self.message = Some(format!("Showing {name}"));
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.workspace.shutdown();
    }
}

fn motion_for(code: KeyCode, control: bool) -> Option<Motion> {
    let motion = match code {
        KeyCode::Left => Motion::Left,
        KeyCode::Right => Motion::Right,
        KeyCode::Up => Motion::Up,
        KeyCode::Down => Motion::Down,
        KeyCode::Home if control => Motion::DocumentStart,
        KeyCode::End if control => Motion::DocumentEnd,
        KeyCode::Home => Motion::LineStart,
        KeyCode::End => Motion::LineEnd,
        _ => return None,
    };
    Some(motion)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchored_selection_engine::EditingSurface;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const TEXT: &str = "hello world\nsecond line\n";

    fn app() -> App {
        App::new("doc", TEXT, IndicatorConfig::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
        app.handle_key(KeyEvent::new(code, modifiers)).unwrap()
    }

    fn toggle_anchor(app: &mut App) {
        press(app, KeyCode::Char(' '), KeyModifiers::CONTROL);
    }

    #[test]
    fn test_arrows_extend_selection_in_anchored_mode() {
        let mut app = app();
        toggle_anchor(&mut app);

        press(&mut app, KeyCode::Right, KeyModifiers::NONE);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);
        press(&mut app, KeyCode::Down, KeyModifiers::NONE);

        assert_eq!(app.active().selection(), Some(0..14));
        assert!(app.indicator().is_anchored(app.active_view()));
    }

    #[test]
    fn test_copy_ends_anchored_mode_and_keeps_selection() {
        let mut app = app();
        toggle_anchor(&mut app);
        press(&mut app, KeyCode::End, KeyModifiers::NONE);

        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(app.clipboard(), Some("hello world"));
        assert_eq!(app.active().selection(), Some(0..11));
        assert!(!app.indicator().is_anchored(app.active_view()));
        assert_eq!(app.message(), Some("Copied 11 characters"));
    }

    #[test]
    fn test_escape_ends_anchored_mode() {
        let mut app = app();
        toggle_anchor(&mut app);

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);

        assert!(!app.workspace().is_anchored(app.active_view()).unwrap());
        assert_eq!(app.active().selection(), None);
    }

    #[test]
    fn test_panes_keep_independent_anchors() {
        let mut app = app();
        let [first, second] = app.panes();
        toggle_anchor(&mut app);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);

        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);

        assert_eq!(app.active_view(), second);
        assert_eq!(app.active().selection(), None);
        assert!(app.indicator().is_anchored(first));
        assert!(!app.indicator().is_anchored(second));
        assert_eq!(
            app.workspace().view(first).unwrap().selection(),
            Some(0..1)
        );
    }

    #[test]
    fn test_scratch_buffer_has_its_own_anchor() {
        let mut app = app();
        let view = app.active_view();
        toggle_anchor(&mut app);

        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        assert!(!app.indicator().is_anchored(view));
        assert_eq!(app.message(), Some("Showing scratch"));

        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        assert!(app.indicator().is_anchored(view));
    }

    #[test]
    fn test_typing_and_deleting_edit_the_document() {
        let mut app = app();

        press(&mut app, KeyCode::Char('>'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char(' '), KeyModifiers::NONE);
        press(&mut app, KeyCode::Delete, KeyModifiers::NONE);
        press(&mut app, KeyCode::Backspace, KeyModifiers::NONE);

        let document = app.active().document();
        assert_eq!(
            app.workspace().buffer_text(document).unwrap(),
            ">ello world\nsecond line\n"
        );
        assert_eq!(app.active().caret(), 1);
    }

    #[test]
    fn test_deleting_the_anchor_leaves_anchored_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);
        toggle_anchor(&mut app);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);

        press(&mut app, KeyCode::Backspace, KeyModifiers::NONE);

        assert!(!app.indicator().is_anchored(app.active_view()));
        assert_eq!(
            app.workspace()
                .buffer_text(app.active().document())
                .unwrap(),
            "hlo world\nsecond line\n"
        );
    }

    #[test]
    fn test_shift_arrows_select_without_anchor() {
        let mut app = app();

        press(&mut app, KeyCode::Right, KeyModifiers::SHIFT);
        press(&mut app, KeyCode::Right, KeyModifiers::SHIFT);

        assert_eq!(app.active().selection(), Some(0..2));
        assert_eq!(app.active().resize_count(), 0);
    }

    #[rstest]
    #[case::quit(KeyCode::Char('q'), KeyModifiers::CONTROL, false)]
    #[case::plain_q_is_typed(KeyCode::Char('q'), KeyModifiers::NONE, true)]
    #[case::unbound_key(KeyCode::F(5), KeyModifiers::NONE, true)]
    fn test_quit_key(
        #[case] code: KeyCode,
        #[case] modifiers: KeyModifiers,
        #[case] keep_running: bool,
    ) {
        let mut app = app();

        assert_eq!(press(&mut app, code, modifiers), keep_running);
    }
}
