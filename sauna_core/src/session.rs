//! Session timer state machine.
//!
//! The timer does not own a thread or read the wall clock while counting:
//! the caller delivers one [`SessionTimer::tick`] per elapsed second. This
//! keeps the machine deterministic and makes pause correctness trivial.
//!
//! ## Stage lifecycle
//!
//! ```text
//! Initial --play--> Running --pause--> Paused --play--> Running
//!    Running --tick (0 left)--> Completed
//!    Running | Paused --end_stage_early--> Completed
//!    Completed --advance--> Initial (next stage) | finished (SessionLog)
//! ```
//!
//! `Completed` is a per-stage state. The session itself ends when `advance`
//! is called on the last stage of the last cycle.

use crate::clock::Clock;
use crate::{Error, Protocol, Result, SessionLog, Stage};
use serde::{Deserialize, Serialize};

/// Status of the current stage's countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Initial,
    Running,
    Paused,
    Completed,
}

/// What a single tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Timer was not running; nothing changed
    Ignored,
    /// One second counted, stage still in progress
    Counted,
    /// One second counted and the stage ran out
    StageComplete,
}

/// Result of acknowledging a completed stage
#[derive(Clone, Debug, PartialEq)]
pub enum Advance {
    /// Moved on to another stage, waiting in `Initial`
    NextStage { cycle: u32, stage_index: usize },
    /// Final stage of the final cycle acknowledged
    Finished(SessionLog),
}

/// Drives one ritual from the first stage to the session log
#[derive(Clone, Debug)]
pub struct SessionTimer {
    protocol: Protocol,
    current_cycle: u32,
    current_stage_index: usize,
    time_left_in_stage: u32,
    total_elapsed_seconds: u32,
    status: TimerStatus,
    finished: bool,
}

impl SessionTimer {
    /// Begin a session on the first stage of the first cycle
    ///
    /// Fails if the protocol would violate the timer invariants.
    pub fn start(protocol: Protocol) -> Result<Self> {
        let errors = protocol.validate();
        if !errors.is_empty() {
            return Err(Error::InvalidProtocol(errors.join("; ")));
        }

        let time_left_in_stage = protocol.stages[0].duration;
        tracing::info!(
            "Starting session '{}' ({} cycles x {} stages)",
            protocol.id,
            protocol.cycles,
            protocol.stages.len()
        );

        Ok(Self {
            protocol,
            current_cycle: 1,
            current_stage_index: 0,
            time_left_in_stage,
            total_elapsed_seconds: 0,
            status: TimerStatus::Initial,
            finished: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    pub fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    pub fn current_stage(&self) -> Stage {
        self.protocol.stages[self.current_stage_index]
    }

    pub fn time_left_in_stage(&self) -> u32 {
        self.time_left_in_stage
    }

    pub fn total_elapsed_seconds(&self) -> u32 {
        self.total_elapsed_seconds
    }

    /// True once the session log has been emitted
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when the current stage is the last stage of the last cycle
    pub fn is_last_stage(&self) -> bool {
        self.current_cycle == self.protocol.cycles
            && self.current_stage_index == self.protocol.stages.len() - 1
    }

    /// 0.0 ..= 1.0 progress within the current stage
    pub fn stage_progress(&self) -> f64 {
        let duration = self.current_stage().duration;
        f64::from(duration - self.time_left_in_stage) / f64::from(duration)
    }

    /// 0.0 ..= 1.0 progress through the planned schedule
    ///
    /// Stages ended early count as fully done.
    pub fn session_progress(&self) -> f64 {
        let total = u64::from(self.protocol.total_duration());
        let done_cycles =
            u64::from(self.current_cycle - 1) * u64::from(self.protocol.cycle_duration());
        let done_stages: u64 = self.protocol.stages[..self.current_stage_index]
            .iter()
            .map(|s| u64::from(s.duration))
            .sum();
        let current = if self.status == TimerStatus::Completed {
            self.current_stage().duration
        } else {
            self.current_stage().duration - self.time_left_in_stage
        };

        let done = done_cycles + done_stages + u64::from(current);
        (done as f64 / total as f64).min(1.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    fn guard(&self, action: &'static str) -> Result<()> {
        if self.finished {
            return Err(Error::InvalidTransition {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn reject(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            status: self.status,
        }
    }

    /// Start or resume the countdown
    ///
    /// Calling while already running is a no-op.
    pub fn play(&mut self) -> Result<()> {
        self.guard("play")?;
        match self.status {
            TimerStatus::Initial | TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                tracing::debug!(
                    "Playing stage {} of cycle {}",
                    self.current_stage_index,
                    self.current_cycle
                );
                Ok(())
            }
            TimerStatus::Running => Ok(()),
            TimerStatus::Completed => Err(self.reject("play")),
        }
    }

    /// Freeze the countdown
    ///
    /// Calling while already paused is a no-op.
    pub fn pause(&mut self) -> Result<()> {
        self.guard("pause")?;
        match self.status {
            TimerStatus::Running => {
                self.status = TimerStatus::Paused;
                tracing::debug!("Paused with {}s left", self.time_left_in_stage);
                Ok(())
            }
            TimerStatus::Paused => Ok(()),
            TimerStatus::Initial | TimerStatus::Completed => Err(self.reject("pause")),
        }
    }

    /// Toggle between running and paused, the single play/pause control
    pub fn toggle(&mut self) -> Result<()> {
        if self.status == TimerStatus::Running {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Account for one elapsed second
    ///
    /// Only counts while running; ticks in any other state are ignored so a
    /// late timer event can never accrue time.
    pub fn tick(&mut self) -> Tick {
        if self.status != TimerStatus::Running || self.finished {
            return Tick::Ignored;
        }

        self.time_left_in_stage = self.time_left_in_stage.saturating_sub(1);
        self.total_elapsed_seconds += 1;

        if self.time_left_in_stage == 0 {
            self.status = TimerStatus::Completed;
            tracing::debug!(
                "Stage {} of cycle {} complete",
                self.current_stage_index,
                self.current_cycle
            );
            Tick::StageComplete
        } else {
            Tick::Counted
        }
    }

    /// Finish the current stage now, without crediting the remaining time
    pub fn end_stage_early(&mut self) -> Result<()> {
        self.guard("end stage")?;
        match self.status {
            TimerStatus::Running | TimerStatus::Paused => {
                tracing::info!(
                    "Ending stage {} early with {}s left",
                    self.current_stage_index,
                    self.time_left_in_stage
                );
                self.status = TimerStatus::Completed;
                Ok(())
            }
            TimerStatus::Initial | TimerStatus::Completed => Err(self.reject("end stage")),
        }
    }

    /// Acknowledge the completed stage and move on
    ///
    /// On the last stage of the last cycle this emits the session log; the
    /// timer then refuses every further action except [`exit`](Self::exit).
    pub fn advance(&mut self, clock: &dyn Clock) -> Result<Advance> {
        self.guard("advance")?;
        if self.status != TimerStatus::Completed {
            return Err(self.reject("advance"));
        }

        if self.is_last_stage() {
            self.finished = true;
            let log = SessionLog {
                protocol_name: self.protocol.name.clone(),
                total_time: self.total_elapsed_seconds,
                cycles_completed: self.protocol.cycles,
                date: clock.now(),
                goal: Some(self.protocol.goal),
            };
            tracing::info!(
                "Session '{}' finished after {}s",
                self.protocol.id,
                log.total_time
            );
            return Ok(Advance::Finished(log));
        }

        let next_index = (self.current_stage_index + 1) % self.protocol.stages.len();
        if next_index == 0 {
            self.current_cycle += 1;
        }
        self.current_stage_index = next_index;
        self.time_left_in_stage = self.protocol.stages[next_index].duration;
        self.status = TimerStatus::Initial;

        Ok(Advance::NextStage {
            cycle: self.current_cycle,
            stage_index: next_index,
        })
    }

    /// Abandon the session; nothing is recorded
    pub fn exit(self) {
        if !self.finished {
            tracing::info!(
                "Session '{}' abandoned after {}s",
                self.protocol.id,
                self.total_elapsed_seconds
            );
        }
    }
}
