//! Terminal session runner.
//!
//! Drives a [`SessionTimer`] from the terminal. The main loop is the only
//! timer source: it waits on a channel fed by a stdin reader thread, with a
//! deadline at the next one-second tick while the stage is running.

use rand::Rng;
use sauna_core::content::{pick_microcopy, pick_tip};
use sauna_core::*;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

/// How a run ended
pub enum Outcome {
    Completed(SessionLog),
    Exited,
}

/// Format seconds as `mm:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn stage_header<R: Rng + ?Sized>(timer: &SessionTimer, rng: &mut R) {
    let stage = timer.current_stage();
    println!();
    println!(
        "── Cycle {}/{} · {} · {} ──",
        timer.current_cycle(),
        timer.protocol().cycles,
        stage.kind.label(),
        format_clock(stage.duration)
    );
    println!("  {}", pick_microcopy(stage.kind, rng));
}

fn stage_done<R: Rng + ?Sized>(timer: &SessionTimer, rng: &mut R) {
    let kind = timer.current_stage().kind;
    println!("  ✓ {} complete", kind.label());
    println!("  Tip: {}", pick_tip(kind, rng));
}

/// Run every stage to completion without waiting
///
/// Used by `--auto-complete` for scripted runs and tests.
pub fn run_auto<R: Rng + ?Sized>(
    timer: &mut SessionTimer,
    clock: &dyn Clock,
    rng: &mut R,
) -> Result<Outcome> {
    loop {
        stage_header(timer, rng);
        timer.play()?;
        while timer.tick() != Tick::StageComplete {}
        stage_done(timer, rng);

        if let Advance::Finished(log) = timer.advance(clock)? {
            return Ok(Outcome::Completed(log));
        }
    }
}

fn spawn_input() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line.trim().to_lowercase()).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_help() {
    println!("  p + Enter  play / pause");
    println!("  e + Enter  end this stage now");
    println!("  n + Enter  next stage (once complete)");
    println!("  q + Enter  exit without saving");
}

fn status_line(timer: &SessionTimer) -> io::Result<()> {
    let state = match timer.status() {
        TimerStatus::Running => "▶",
        TimerStatus::Paused => "⏸",
        TimerStatus::Initial => "·",
        TimerStatus::Completed => "✓",
    };
    print!(
        "\r  {} {} left · stage {:>3.0}% · session {:>3.0}%   ",
        state,
        format_clock(timer.time_left_in_stage()),
        timer.stage_progress() * 100.0,
        timer.session_progress() * 100.0
    );
    io::stdout().flush()
}

/// Run a session interactively
pub fn run_interactive<R: Rng + ?Sized>(
    timer: &mut SessionTimer,
    clock: &dyn Clock,
    rng: &mut R,
) -> Result<Outcome> {
    let input = spawn_input();
    print_help();
    stage_header(timer, rng);
    println!("  Press p + Enter to start.");

    let mut next_tick = Instant::now() + TICK;

    loop {
        let received = if timer.status() == TimerStatus::Running {
            let wait = next_tick.saturating_duration_since(Instant::now());
            input.recv_timeout(wait)
        } else {
            input.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };

        let command = match received {
            Ok(command) => command,
            Err(RecvTimeoutError::Timeout) => {
                next_tick += TICK;
                if timer.tick() == Tick::StageComplete {
                    status_line(timer)?;
                    println!();
                    stage_done(timer, rng);
                    println!("  Press n + Enter to continue.");
                } else {
                    status_line(timer)?;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                println!();
                tracing::warn!("Input closed; leaving the session");
                return Ok(Outcome::Exited);
            }
        };

        let result = match command.as_str() {
            "p" => {
                let was_running = timer.status() == TimerStatus::Running;
                let result = timer.toggle();
                if !was_running && timer.status() == TimerStatus::Running {
                    next_tick = Instant::now() + TICK;
                }
                result.and_then(|_| status_line(timer).map_err(Error::from))
            }
            "e" => timer.end_stage_early().map(|_| {
                println!();
                stage_done(timer, rng);
                println!("  Press n + Enter to continue.");
            }),
            "n" => match timer.advance(clock) {
                Ok(Advance::Finished(log)) => return Ok(Outcome::Completed(log)),
                Ok(Advance::NextStage { .. }) => {
                    stage_header(timer, rng);
                    println!("  Press p + Enter to start.");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "q" => return Ok(Outcome::Exited),
            "" => Ok(()),
            _ => {
                print_help();
                Ok(())
            }
        };

        // Rejected key presses are shown, not fatal
        if let Err(e) = result {
            match e {
                Error::InvalidTransition { .. } => {
                    println!();
                    println!("  {}", e);
                }
                _ => return Err(e),
            }
        }
    }
}
