use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Speed;
use crate::snake::Direction::{self, *};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Steer(Direction),
    TogglePause,
    SetSpeed(Speed),
    Restart,
    Quit,
    /// A key with no binding.
    Ignore,
}

pub fn command_for(ev: &KeyEvent) -> Command {
    if is_ctrl_c(ev) {
        return Command::Quit;
    }

    match ev.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Command::Steer(Up),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Command::Steer(Left),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Command::Steer(Down),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Command::Steer(Right),
        KeyCode::Char('1') => Command::SetSpeed(Speed::Slow),
        KeyCode::Char('2') => Command::SetSpeed(Speed::Normal),
        KeyCode::Char('3') => Command::SetSpeed(Speed::Fast),
        KeyCode::Char('4') => Command::SetSpeed(Speed::Insane),
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Restart,
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Esc => Command::TogglePause,
        _ => Command::Ignore,
    }
}

pub fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
