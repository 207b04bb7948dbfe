use crate::app::App;
use crate::input::InputAction;

pub fn dispatch(app: &mut App, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => {
            app.cancel_opening();
            app.should_quit = true;
        }
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::NextFocus => app.cycle_focus(true),
        InputAction::PrevFocus => app.cycle_focus(false),
        InputAction::MoveUp => app.move_cursor(false),
        InputAction::MoveDown => app.move_cursor(true),
        InputAction::OpenPack => app.buy_and_open(),
        InputAction::Cancel => {
            if app.show_help {
                app.show_help = false;
            } else {
                app.cancel_opening();
            }
        }
        InputAction::SyncAlbum => app.sync_album(),
        InputAction::DeclineNext => app.reject_next_purchase(),
        InputAction::ToggleWallet => app.toggle_wallet(),
    }
}
