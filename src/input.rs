use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Refresh,
    ShowRuns,
    OpenSelection,
    // Runs overlay
    OpenRunPage,
    ReloadRuns,
    // Selection overlay
    ToggleCheckbox,
    SelectAll,
    ClearAll,
    FocusSearch,
    LeaveSearch,
    SearchInput(char),
    SearchBackspace,
    ApplySelection,
    CloseOverlay,
    None,
}

/// Which overlay (if any) is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    None,
    /// Selection overlay, keys drive the checkbox list.
    Select,
    /// Selection overlay, keys edit the search query.
    Search,
    Runs,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub is_loading: bool,
    pub overlay: OverlayMode,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match ctx.overlay {
        OverlayMode::Search => {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc => Action::LeaveSearch,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            };
        }
        OverlayMode::Select => {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
                KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
                KeyCode::Char(' ') => Action::ToggleCheckbox,
                KeyCode::Char('a') => Action::SelectAll,
                KeyCode::Char('n') => Action::ClearAll,
                KeyCode::Char('/') => Action::FocusSearch,
                KeyCode::Enter => Action::ApplySelection,
                KeyCode::Char('q') | KeyCode::Esc => Action::CloseOverlay,
                _ => Action::None,
            };
        }
        OverlayMode::Runs => {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
                KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
                KeyCode::Char('o') => Action::OpenRunPage,
                KeyCode::Char('r') => Action::ReloadRuns,
                KeyCode::Char('q') | KeyCode::Esc => Action::CloseOverlay,
                _ => Action::None,
            };
        }
        OverlayMode::None => {}
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Enter => Action::ShowRuns,
        KeyCode::Char('s') => Action::OpenSelection,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        _ => Action::None,
    }
}
