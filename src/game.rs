use std::time::Duration;

use anyhow::{bail, Result};
use log::info;
use rand::{rngs::ThreadRng, Rng};

use crate::clock::{Clock, Scheduler, SystemClock, Timer};
use crate::config::{GameConfig, Speed};
use crate::input::{self, Command};
use crate::snake::Snake;
use crate::state::{Collision, Ending, GameState, Phase, TickOutcome};
use crate::term::TermManager;
use crate::{Coord, Coords, TermCoords, TermInt};

/// Terminal columns per tile, so tiles come out roughly square.
const TILE_WIDTH: TermInt = 2;

const SNAKE_BODY_GLYPH: &str = "██";
const FOOD_GLYPH: &str = "()";
const DEAD_SNAKE_GLYPH: &str = "XX";
const EMPTY_GLYPH: &str = "  ";

pub enum Flow {
    Restart,
    Quit,
}

/// What a due timer changed, for the driver to draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TimerEffect {
    /// The pause after a mistake ended.
    Resumed,
    Ticked(TickOutcome),
    Unchanged,
}

pub struct SnakeGame {
    config: GameConfig,
    speed: Speed,
    term: TermManager,
    rng: ThreadRng,
}

impl SnakeGame {
    pub fn new(config: GameConfig) -> Result<Self> {
        let speed = config.speed;
        Ok(SnakeGame { config, speed, term: TermManager::new()?, rng: rand::thread_rng() })
    }

    /// Checks the grid fits, then switches the terminal into game mode.
    pub fn initialize(&mut self) -> Result<()> {
        let (w, h) = board_size(self.config.cells());
        let (term_w, term_h) = self.term.get_terminal_size();

        // One extra row for the status line
        if term_w < w || term_h < h + 1 {
            bail!("Terminal too small: need {}x{}, have {}x{}", w, h + 1, term_w, term_h);
        }

        self.term.setup()
    }

    pub fn restore(&mut self) -> Result<()> {
        self.term.restore()
    }

    pub fn run(&mut self) -> Result<()> {
        if let Flow::Quit = self.show_intro()? {
            return Ok(());
        }

        loop {
            if let Flow::Quit = self.play()? {
                return Ok(());
            }
        }
    }

    fn show_intro(&mut self) -> Result<Flow> {
        self.term.clear()?;
        let (w, h) = board_size(self.config.cells());
        self.term.draw_borders(w, h)?;

        let allowance = format!("{} mistakes and you're out", self.config.max_mistakes);
        self.term.show_message(&[
            "Arrow keys or WASD to move",
            "Esc to pause, 1-4 to set speed",
            "R to restart, Q to quit",
            &allowance,
            "",
            "Press any key to begin"
        ])?;

        match input::command_for(&self.term.read_key_blocking()?) {
            Command::Quit => Ok(Flow::Quit),
            _ => Ok(Flow::Restart),
        }
    }

    fn play(&mut self) -> Result<Flow> {
        self.term.clear()?;
        let (w, h) = board_size(self.config.cells());
        self.term.draw_borders(w, h)?;

        let mut state = GameState::new(&self.config, &mut self.rng);
        let mut scheduler = Scheduler::new(SystemClock, self.speed.tick_interval());

        self.draw_state(&state)?;

        while !state.is_over() {
            for key_ev in self.term.read_key_events(scheduler.time_until_next())? {
                match input::command_for(&key_ev) {
                    Command::Quit => return Ok(Flow::Quit),
                    Command::Restart => {
                        info!("Restart requested at score {}", state.score());
                        return Ok(Flow::Restart);
                    }
                    Command::TogglePause => self.toggle_pause(&mut scheduler, &state)?,
                    Command::SetSpeed(speed) => self.set_speed(speed, &mut scheduler, &state)?,
                    Command::Steer(dir) => {
                        if !scheduler.is_frozen() {
                            state.steer(dir);
                        }
                    }
                    Command::Ignore => {}
                }
            }

            while let Some(timer) = scheduler.poll() {
                let resume_delay = self.config.resume_delay();
                let effect = on_timer(timer, &mut state, &mut scheduler, &mut self.rng, resume_delay);
                self.draw_effect(&state, effect)?;

                if state.is_over() {
                    break;
                }
            }
        }

        self.game_over(&state)?;

        // A finished game stays on screen until the player picks what's next
        loop {
            match input::command_for(&self.term.read_key_blocking()?) {
                Command::Quit => return Ok(Flow::Quit),
                Command::Restart => return Ok(Flow::Restart),
                _ => {}
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw_effect(&mut self, state: &GameState, effect: TimerEffect) -> Result<()> {
        let outcome = match effect {
            TimerEffect::Resumed => return self.term.hide_message(),
            TimerEffect::Ticked(outcome) => outcome,
            TimerEffect::Unchanged => return Ok(()),
        };

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Moved { new_head, old_head, old_tail, ate } => {
                // Tail first: the head may have moved into the tail's old tile
                if let Some(tail) = old_tail {
                    self.draw_tile(state, tail, EMPTY_GLYPH)?;
                }
                self.draw_tile(state, old_head, SNAKE_BODY_GLYPH)?;
                self.draw_head(state, new_head)?;

                if ate {
                    let food = state.food();
                    self.draw_tile(state, food, FOOD_GLYPH)?;
                }

                self.draw_status(state)?;
                self.term.flush()?;
            }
            TickOutcome::Mistake { collision, mistakes } => {
                self.draw_status(state)?;
                self.show_mistake(mistake_lines(collision, mistakes, state.max_mistakes()))?;
            }
            TickOutcome::BoardFull { new_head, old_head } => {
                self.draw_tile(state, old_head, SNAKE_BODY_GLYPH)?;
                self.draw_head(state, new_head)?;
                self.draw_status(state)?;
            }
            TickOutcome::GameOver(_) => {
                self.draw_status(state)?;
            }
        }

        Ok(())
    }

    fn game_over(&mut self, state: &GameState) -> Result<()> {
        let ending = match state.phase() {
            Phase::GameOver(ending) => ending,
            _ => return Ok(()),
        };

        let s = match ending {
            Ending::OutOfMistakes => {
                for pos in state.snake().body().iter() {
                    self.draw_tile(state, *pos, DEAD_SNAKE_GLYPH)?;
                }
                "Game over!"
            }
            Ending::BoardFull => "You filled the board!",
        };

        self.term.show_message(&[
            s,
            &*format!("Score: {}", state.score()),
            "",
            "Press R to play again,",
            "or Q to quit."
        ])
    }

    fn show_mistake(&mut self, (what, count): (&str, String)) -> Result<()> {
        self.term.show_message(&[what, &count, "Turn to keep going"])
    }

    fn toggle_pause<C: Clock>(&mut self, scheduler: &mut Scheduler<C>, state: &GameState) -> Result<()> {
        if !scheduler.is_frozen() {
            scheduler.freeze();
            return self.term.show_message(&["Paused", "Press Esc to resume", "or Q to quit"]);
        }

        scheduler.thaw();
        // Still waiting out a mistake: put its notice back
        match pending_mistake(state) {
            Some(lines) => self.show_mistake(lines),
            None => self.term.hide_message(),
        }
    }

    fn set_speed<C: Clock>(&mut self, speed: Speed, scheduler: &mut Scheduler<C>, state: &GameState) -> Result<()> {
        if speed.tick_interval() == scheduler.interval() {
            return Ok(());
        }

        info!("Speed changed from {} to {}", self.speed.name(), speed.name());
        self.speed = speed;
        scheduler.set_interval(speed.tick_interval());
        self.draw_status(state)?;
        self.term.flush()
    }

    fn draw_state(&mut self, state: &GameState) -> Result<()> {
        for pos in state.snake().body().iter().skip(1) {
            self.draw_tile(state, *pos, SNAKE_BODY_GLYPH)?;
        }
        self.draw_head(state, state.snake().head())?;
        self.draw_tile(state, state.food(), FOOD_GLYPH)?;
        self.draw_status(state)?;
        self.term.flush()
    }

    fn draw_head(&mut self, state: &GameState, pos: Coords) -> Result<()> {
        let ch = Snake::head_char(state.heading());
        let glyph: String = [ch, ch].iter().collect();
        self.draw_tile(state, pos, &glyph)
    }

    fn draw_tile(&mut self, state: &GameState, pos: Coords, glyph: &str) -> Result<()> {
        self.term.print_str_at(tile_origin(pos, state.tile()), glyph)
    }

    fn draw_status(&mut self, state: &GameState) -> Result<()> {
        let (w, h) = board_size(self.config.cells());
        let line = format!("{:<width$}", status_line(state, self.speed), width = w as usize);
        self.term.print_str_at((0, h), &line)
    }
}

/// Runs one due timer against the game. A mistake starts the resume
/// countdown; the resume timer ends the pause.
fn on_timer<C: Clock, R: Rng>(
    timer: Timer,
    state: &mut GameState,
    scheduler: &mut Scheduler<C>,
    rng: &mut R,
    resume_delay: Duration,
) -> TimerEffect {
    match timer {
        Timer::Resume => {
            if state.resume() {
                TimerEffect::Resumed
            } else {
                TimerEffect::Unchanged
            }
        }
        Timer::Tick => {
            let outcome = state.tick(rng);
            if let TickOutcome::Mistake { .. } = outcome {
                scheduler.schedule_resume(resume_delay);
            }
            TimerEffect::Ticked(outcome)
        }
    }
}

fn mistake_lines(collision: Collision, mistakes: u32, max_mistakes: u32) -> (&'static str, String) {
    let what = match collision {
        Collision::Wall => "You hit the wall!",
        Collision::SelfBite => "You bit yourself!",
    };
    (what, format!("Mistake {} of {}", mistakes, max_mistakes))
}

/// The notice for the mistake the game is paused on, if any.
fn pending_mistake(state: &GameState) -> Option<(&'static str, String)> {
    match (state.phase(), state.last_collision()) {
        (Phase::Paused, Some(collision)) => {
            Some(mistake_lines(collision, state.mistakes(), state.max_mistakes()))
        }
        _ => None,
    }
}

/// Terminal size of the bordered board for a grid `cells` tiles wide.
fn board_size(cells: Coord) -> TermCoords {
    let cells = cells as TermInt;
    (cells * TILE_WIDTH + 2, cells + 2)
}

/// Where a canvas position lands on screen, inside the border.
fn tile_origin(pos: Coords, tile: Coord) -> TermCoords {
    let col = (pos.0 / tile) as TermInt;
    let row = (pos.1 / tile) as TermInt;
    (col * TILE_WIDTH + 1, row + 1)
}

fn status_line(state: &GameState, speed: Speed) -> String {
    format!(
        "Score: {}  Mistakes: {}/{}  Speed: {}",
        state.score(),
        state.mistakes(),
        state.max_mistakes(),
        speed.name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::snake::Direction;
    use rand::{rngs::StdRng, SeedableRng};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Drains every due timer, like one pass of the play loop.
    fn run_due<C: Clock>(
        state: &mut GameState,
        scheduler: &mut Scheduler<C>,
        rng: &mut StdRng,
        resume_delay: Duration,
    ) -> Vec<TimerEffect> {
        let mut effects = vec![];
        while let Some(timer) = scheduler.poll() {
            effects.push(on_timer(timer, state, scheduler, rng, resume_delay));
        }
        effects
    }

    #[test]
    fn test_wall_hit_resumes_after_delay() {
        let config = GameConfig::default();
        let snake = Snake::from_segments(&[(380, 100), (360, 100)]);
        let mut state = GameState::with_layout(&config, snake, (0, 0), Direction::Right);
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));
        let mut rng = StdRng::seed_from_u64(7);
        let delay = ms(1000);

        clock.advance(ms(100));
        let effects = run_due(&mut state, &mut scheduler, &mut rng, delay);
        assert_eq!(
            effects,
            vec![TimerEffect::Ticked(TickOutcome::Mistake { collision: Collision::Wall, mistakes: 1 })]
        );
        assert_eq!(state.phase(), Phase::Paused);

        // Ticks keep coming during the pause but change nothing
        for _ in 0..9 {
            clock.advance(ms(100));
            let effects = run_due(&mut state, &mut scheduler, &mut rng, delay);
            assert_eq!(effects, vec![TimerEffect::Ticked(TickOutcome::Idle)]);
            assert_eq!(state.phase(), Phase::Paused);
        }
        clock.advance(ms(99));
        assert!(run_due(&mut state, &mut scheduler, &mut rng, delay).is_empty());
        assert_eq!(state.phase(), Phase::Paused);

        clock.advance(ms(1));
        let effects = run_due(&mut state, &mut scheduler, &mut rng, delay);
        assert_eq!(effects[0], TimerEffect::Resumed);
        assert_eq!(state.phase(), Phase::Running);
        assert_eq!(state.mistakes(), 1);
    }

    #[test]
    fn test_stray_resume_changes_nothing() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, &mut StdRng::seed_from_u64(7));
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));
        let mut rng = StdRng::seed_from_u64(7);

        let effect = on_timer(Timer::Resume, &mut state, &mut scheduler, &mut rng, ms(1000));
        assert_eq!(effect, TimerEffect::Unchanged);
        assert_eq!(state.phase(), Phase::Running);
    }

    #[test]
    fn test_game_over_does_not_schedule_resume() {
        let config = GameConfig { max_mistakes: 1, ..Default::default() };
        let snake = Snake::from_segments(&[(380, 100), (360, 100)]);
        let mut state = GameState::with_layout(&config, snake, (0, 0), Direction::Right);
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));
        let mut rng = StdRng::seed_from_u64(7);

        let effect = on_timer(Timer::Tick, &mut state, &mut scheduler, &mut rng, ms(50));
        assert_eq!(effect, TimerEffect::Ticked(TickOutcome::GameOver(Ending::OutOfMistakes)));
        // Only the recurring tick is left
        assert_eq!(scheduler.time_until_next(), ms(100));
    }

    #[test]
    fn test_pending_mistake_only_while_paused() {
        let config = GameConfig::default();
        let snake = Snake::from_segments(&[(380, 100), (360, 100)]);
        let mut state = GameState::with_layout(&config, snake, (0, 0), Direction::Right);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pending_mistake(&state), None);

        state.tick(&mut rng);
        assert_eq!(
            pending_mistake(&state),
            Some(("You hit the wall!", "Mistake 1 of 3".to_string()))
        );

        state.resume();
        assert_eq!(pending_mistake(&state), None);
    }

    #[test]
    fn test_mistake_lines() {
        assert_eq!(mistake_lines(Collision::Wall, 1, 3), ("You hit the wall!", "Mistake 1 of 3".to_string()));
        assert_eq!(mistake_lines(Collision::SelfBite, 2, 5), ("You bit yourself!", "Mistake 2 of 5".to_string()));
    }

    #[test]
    fn test_board_size_includes_border() {
        assert_eq!(board_size(20), (42, 22));
        assert_eq!(board_size(5), (12, 7));
    }

    #[test]
    fn test_tile_origin() {
        assert_eq!(tile_origin((0, 0), 20), (1, 1));
        assert_eq!(tile_origin((200, 200), 20), (21, 11));
        assert_eq!(tile_origin((380, 380), 20), (39, 20));
    }

    #[test]
    fn test_last_tile_fits_inside_border() {
        let (w, h) = board_size(20);
        let (x, y) = tile_origin((380, 380), 20);
        assert!(x + TILE_WIDTH < w);
        assert!(y < h - 1);
    }

    #[test]
    fn test_status_line() {
        let config = GameConfig::default();
        let snake = Snake::new((200, 200), 3, Direction::Right, 20);
        let state = GameState::with_layout(&config, snake, (0, 0), Direction::Right);

        assert_eq!(status_line(&state, Speed::Fast), "Score: 0  Mistakes: 0/3  Speed: fast");
    }
}
