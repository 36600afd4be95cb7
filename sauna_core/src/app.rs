//! Application navigation flow.
//!
//! An explicit state machine over the app's screens. It owns the loaded
//! profile and history, the protocol being prepared, the running timer and
//! the last finished session, and is the only component that writes to the
//! persistence port.
//!
//! Every transition ends with [`AppFlow::heal`], which sends inconsistent
//! states (a session screen without a protocol, a summary without a log)
//! back to the dashboard instead of failing.

use crate::history::load_history;
use crate::session::SessionTimer;
use crate::store::{KeyValueStore, SessionSink, KEY_GOAL, KEY_HEALTH_CHECK, KEY_USER_NAME};
use crate::{Error, Goal, Profile, Protocol, Result, SessionLog};

/// Screens of the app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Loading,
    HealthCheck,
    Onboarding,
    Dashboard,
    ProtocolSelection,
    CustomProtocol,
    SessionSettings,
    InSession,
    Summary,
}

/// Load the profile fields from the store
pub fn load_profile<S: KeyValueStore + ?Sized>(store: &S) -> Result<Profile> {
    let health_check_accepted = store.get(KEY_HEALTH_CHECK)?.as_deref() == Some("true");
    let user_name = store.get(KEY_USER_NAME)?.filter(|n| !n.trim().is_empty());
    let goal = match store.get(KEY_GOAL)? {
        Some(raw) => {
            let goal = Goal::parse(&raw);
            if goal.is_none() {
                tracing::warn!("Ignoring unknown stored goal {:?}", raw);
            }
            goal
        }
        None => None,
    };

    Ok(Profile {
        health_check_accepted,
        user_name,
        goal,
    })
}

/// Navigation state machine bound to a store
pub struct AppFlow<S: KeyValueStore> {
    store: S,
    screen: Screen,
    profile: Profile,
    history: Vec<SessionLog>,
    selected_protocol: Option<Protocol>,
    timer: Option<SessionTimer>,
    last_completed: Option<SessionLog>,
}

impl<S: KeyValueStore> AppFlow<S> {
    /// Create a flow in the `Loading` screen; call [`load`](Self::load) next
    pub fn new(store: S) -> Self {
        Self {
            store,
            screen: Screen::Loading,
            profile: Profile::default(),
            history: Vec::new(),
            selected_protocol: None,
            timer: None,
            last_completed: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn history(&self) -> &[SessionLog] {
        &self.history
    }

    pub fn selected_protocol(&self) -> Option<&Protocol> {
        self.selected_protocol.as_ref()
    }

    pub fn timer(&self) -> Option<&SessionTimer> {
        self.timer.as_ref()
    }

    pub fn timer_mut(&mut self) -> Option<&mut SessionTimer> {
        self.timer.as_mut()
    }

    pub fn last_completed(&self) -> Option<&SessionLog> {
        self.last_completed.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn require_screen(&self, allowed: &[Screen], action: &str) -> Result<()> {
        if allowed.contains(&self.screen) {
            Ok(())
        } else {
            Err(Error::Navigation(format!(
                "cannot {} from {:?}",
                action, self.screen
            )))
        }
    }

    fn go(&mut self, screen: Screen) -> Screen {
        tracing::debug!("Navigating {:?} -> {:?}", self.screen, screen);
        self.screen = screen;
        self.heal()
    }

    fn screen_after_health_check(&self) -> Screen {
        if self.profile.is_onboarded() {
            Screen::Dashboard
        } else {
            Screen::Onboarding
        }
    }

    /// Read profile and history from the store and pick the first screen
    pub fn load(&mut self) -> Result<Screen> {
        self.require_screen(&[Screen::Loading], "load")?;

        self.profile = load_profile(&self.store)?;
        self.history = load_history(&self.store)?;

        let screen = if !self.profile.health_check_accepted {
            Screen::HealthCheck
        } else {
            self.screen_after_health_check()
        };
        Ok(self.go(screen))
    }

    pub fn accept_health_check(&mut self) -> Result<Screen> {
        self.require_screen(&[Screen::HealthCheck], "accept health check")?;
        self.store.set(KEY_HEALTH_CHECK, "true")?;
        self.profile.health_check_accepted = true;
        let screen = self.screen_after_health_check();
        Ok(self.go(screen))
    }

    pub fn complete_onboarding(&mut self, name: &str, goal: Goal) -> Result<Screen> {
        self.require_screen(&[Screen::Onboarding], "complete onboarding")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Navigation("a name is required".into()));
        }

        self.store.set(KEY_USER_NAME, name)?;
        self.store.set(KEY_GOAL, goal.as_str())?;
        self.profile.user_name = Some(name.to_string());
        self.profile.goal = Some(goal);
        tracing::info!("Onboarded {} with goal {}", name, goal);
        Ok(self.go(Screen::Dashboard))
    }

    pub fn start_ritual(&mut self) -> Result<Screen> {
        self.require_screen(&[Screen::Dashboard], "start ritual")?;
        Ok(self.go(Screen::ProtocolSelection))
    }

    pub fn create_custom_ritual(&mut self) -> Result<Screen> {
        self.require_screen(&[Screen::ProtocolSelection], "create custom ritual")?;
        Ok(self.go(Screen::CustomProtocol))
    }

    /// Pick a protocol (built-in or custom) and open its settings
    pub fn select_protocol(&mut self, protocol: Protocol) -> Result<Screen> {
        self.require_screen(
            &[Screen::ProtocolSelection, Screen::CustomProtocol],
            "select protocol",
        )?;
        self.selected_protocol = Some(protocol);
        Ok(self.go(Screen::SessionSettings))
    }

    /// Start the session with the (possibly adjusted) protocol
    pub fn start_session(&mut self, protocol: Protocol) -> Result<Screen> {
        self.require_screen(&[Screen::SessionSettings], "start session")?;
        let timer = SessionTimer::start(protocol.clone())?;
        self.selected_protocol = Some(protocol);
        self.timer = Some(timer);
        Ok(self.go(Screen::InSession))
    }

    /// Abandon the running session without recording anything
    pub fn exit_session(&mut self) -> Result<Screen> {
        self.require_screen(&[Screen::InSession], "exit session")?;
        if let Some(timer) = self.timer.take() {
            timer.exit();
        }
        self.selected_protocol = None;
        Ok(self.go(Screen::Dashboard))
    }

    /// Record a finished session and show its summary
    pub fn complete_session(&mut self, log: SessionLog) -> Result<Screen> {
        self.require_screen(&[Screen::InSession], "complete session")?;
        self.store.append(&log)?;
        self.history = load_history(&self.store)?;
        self.timer = None;
        self.last_completed = Some(log);
        Ok(self.go(Screen::Summary))
    }

    pub fn back_to_dashboard(&mut self) -> Result<Screen> {
        self.require_screen(
            &[
                Screen::Summary,
                Screen::ProtocolSelection,
                Screen::Dashboard,
            ],
            "return to dashboard",
        )?;
        self.selected_protocol = None;
        self.last_completed = None;
        Ok(self.go(Screen::Dashboard))
    }

    pub fn back_to_protocol_selection(&mut self) -> Result<Screen> {
        self.require_screen(
            &[Screen::CustomProtocol, Screen::SessionSettings],
            "return to protocol selection",
        )?;
        self.selected_protocol = None;
        Ok(self.go(Screen::ProtocolSelection))
    }

    /// Forget name and goal and redo onboarding
    pub fn change_goal(&mut self) -> Result<Screen> {
        self.require_screen(&[Screen::Dashboard], "change goal")?;
        self.store.remove(KEY_GOAL)?;
        self.store.remove(KEY_USER_NAME)?;
        self.profile.goal = None;
        self.profile.user_name = None;
        Ok(self.go(Screen::Onboarding))
    }

    /// Wipe all stored data and start over at the health check
    ///
    /// Allowed from any screen.
    pub fn reset(&mut self) -> Result<Screen> {
        self.store.clear()?;
        if let Some(timer) = self.timer.take() {
            timer.exit();
        }
        self.profile = Profile::default();
        self.history.clear();
        self.selected_protocol = None;
        self.last_completed = None;
        tracing::info!("All stored data cleared");
        Ok(self.go(Screen::HealthCheck))
    }

    /// Return to the dashboard from a screen whose data is missing
    pub fn heal(&mut self) -> Screen {
        let broken = match self.screen {
            Screen::SessionSettings => self.selected_protocol.is_none(),
            Screen::InSession => self.selected_protocol.is_none() || self.timer.is_none(),
            Screen::Summary => self.last_completed.is_none(),
            _ => false,
        };

        if broken {
            tracing::warn!(
                "Inconsistent state: {:?} without its data. Returning to dashboard.",
                self.screen
            );
            self.timer = None;
            self.screen = Screen::Dashboard;
        }
        self.screen
    }
}
