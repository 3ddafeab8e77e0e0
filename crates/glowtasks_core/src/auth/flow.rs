//! Authentication flow driver.
//!
//! # Responsibility
//! - Apply submissions to [`AuthState`] using confirm-then-apply semantics.
//! - Surface the last error/info text the way a form would.
//! - Keep the cooldown timer in step with the current mode.
//!
//! # Invariants
//! - State borrows are never held across an `.await`.
//! - The busy slot is released on every exit path (guard drop).
//! - Switching modes stops the timer and zeroes the cooldown.

use super::cooldown::{CooldownTick, CooldownTicks, CooldownTimer};
use super::state::{
    AuthMode, AuthState, EntryMode, OtpChallenge, Password, RESEND_COOLDOWN_SECONDS,
};
use super::{required, required_email, required_secret, AuthError, AuthResult};
use crate::api::ApiClient;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};

const REGISTER_SENT_INFO: &str = "We sent an OTP to your email. Please enter it to verify.";
const VERIFIED_INFO: &str = "Email verified! Logging you in...";
const VERIFY_RESENT_INFO: &str = "New OTP sent to your email.";
const FORGOT_SENT_INFO: &str = "If this email exists, an OTP has been sent.";
const FORGOT_RESENT_INFO: &str = "If this email exists, a new OTP has been sent.";
const RESET_DONE_INFO: &str = "Password reset successful. Logging you in...";

/// Last user-facing texts produced by the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowMessages {
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Marks the flow busy for as long as it lives.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> AuthResult<Self> {
        if flag.replace(true) {
            return Err(AuthError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct AuthFlow {
    api: ApiClient,
    state: RefCell<AuthState>,
    messages: RefCell<FlowMessages>,
    busy: Cell<bool>,
    timer: CooldownTimer,
}

impl AuthFlow {
    /// Creates the flow and the tick receiver the host must forward to
    /// [`AuthFlow::on_tick`].
    ///
    /// Starts in `Authenticated` when the session already holds an identity.
    pub fn new(api: ApiClient) -> (Self, CooldownTicks) {
        let initial = match api.session().identity() {
            Some(identity) => AuthState::Authenticated { identity },
            None => AuthState::Login,
        };
        info!(
            "event=auth_init module=auth status=ok mode={}",
            initial.mode()
        );
        let (timer, ticks) = CooldownTimer::channel();
        let flow = Self {
            api,
            state: RefCell::new(initial),
            messages: RefCell::new(FlowMessages::default()),
            busy: Cell::new(false),
            timer,
        };
        (flow, ticks)
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn mode(&self) -> AuthMode {
        self.state.borrow().mode()
    }

    pub fn cooldown_seconds(&self) -> u32 {
        self.state.borrow().cooldown_seconds()
    }

    pub fn messages(&self) -> FlowMessages {
        self.messages.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.mode() == AuthMode::Authenticated
    }

    /// Whether a cooldown ticker task is alive.
    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub async fn submit_login(&self, identifier: &str, password: &str) -> AuthResult<String> {
        let outcome = self.login_inner(identifier, password).await;
        self.settle("login", outcome, "Login failed")
    }

    pub async fn submit_register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<()> {
        let outcome = self.register_inner(username, email, password).await;
        self.settle("register", outcome, "Register failed")
    }

    /// Verifies the registration code, then signs in with the pending
    /// email and the password given at registration.
    pub async fn submit_otp(&self, otp: &str) -> AuthResult<String> {
        let outcome = self.verify_inner(otp).await;
        self.settle("verify_otp", outcome, "Verification failed")
    }

    /// Requests a new code for the current OTP mode.
    ///
    /// Rejected locally, without a request, while the cooldown is positive.
    pub async fn resend_otp(&self) -> AuthResult<()> {
        let outcome = self.resend_inner().await;
        self.settle("resend_otp", outcome, "Could not resend OTP")
    }

    /// Requests a reset code. The response does not reveal whether the
    /// email is registered.
    pub async fn submit_forgot(&self, email: &str) -> AuthResult<()> {
        let outcome = self.forgot_inner(email).await;
        self.settle("forgot", outcome, "Something went wrong")
    }

    /// Resets the password with the emailed code, then signs in with it.
    pub async fn submit_reset(&self, otp: &str, new_password: &str) -> AuthResult<String> {
        let outcome = self.reset_inner(otp, new_password).await;
        self.settle("reset", outcome, "Reset failed")
    }

    /// Moves to another entry form, discarding messages and any cooldown.
    pub fn switch_mode(&self, next: EntryMode) -> AuthResult<()> {
        let current = self.mode();
        if current == AuthMode::Authenticated {
            return Err(wrong_mode("unauthenticated", current));
        }
        self.timer.disarm();
        *self.state.borrow_mut() = next.into();
        *self.messages.borrow_mut() = FlowMessages::default();
        debug!(
            "event=auth_transition module=auth status=ok from={current} to={}",
            self.mode()
        );
        Ok(())
    }

    /// Clears the session and returns to the login form.
    ///
    /// Store caches are not touched here; [`crate::ClientContext::logout`]
    /// clears them as well.
    pub fn logout(&self) -> AuthResult<()> {
        self.expect_mode(AuthMode::Authenticated)?;
        self.api.session().sign_out()?;
        self.timer.disarm();
        *self.state.borrow_mut() = AuthState::Login;
        *self.messages.borrow_mut() = FlowMessages::default();
        info!("event=auth_logout module=auth status=ok");
        Ok(())
    }

    /// Applies a tick from the ticker; stale ticks are dropped.
    pub fn on_tick(&self, tick: CooldownTick) {
        if !self.timer.is_current(tick) {
            debug!("event=cooldown_tick module=auth status=skipped reason=stale_epoch");
            return;
        }
        self.elapse_second();
    }

    /// Counts one second off the current cooldown. Hosts driving their own
    /// clock call this directly instead of forwarding ticks.
    pub fn elapse_second(&self) {
        let drained = {
            let mut state = self.state.borrow_mut();
            match state.challenge_mut() {
                Some(challenge) if challenge.cooldown_seconds > 0 => {
                    challenge.cooldown_seconds -= 1;
                    challenge.cooldown_seconds == 0
                }
                _ => false,
            }
        };
        if drained {
            self.timer.disarm();
            debug!("event=cooldown_done module=auth status=ok");
        }
    }

    async fn login_inner(&self, identifier: &str, password: &str) -> AuthResult<String> {
        self.expect_mode(AuthMode::Login)?;
        let identifier = required("Username or email", identifier)?;
        let password = required_secret("Password", password)?;
        let _busy = self.begin()?;

        let response = self.api.login(identifier, password).await?;
        self.authenticate(&response.username)
    }

    async fn register_inner(&self, username: &str, email: &str, password: &str) -> AuthResult<()> {
        self.expect_mode(AuthMode::Register)?;
        let username = required("Username", username)?;
        let email = required_email(email)?;
        let password = required_secret("Password", password)?;
        let _busy = self.begin()?;

        self.api.register(username, email, password).await?;
        self.enter_challenge(AuthState::VerifyOtp {
            challenge: OtpChallenge::fresh(email),
            password: Password::new(password),
        });
        self.set_info(REGISTER_SENT_INFO);
        Ok(())
    }

    async fn verify_inner(&self, otp: &str) -> AuthResult<String> {
        let (email, password) = match self.state() {
            AuthState::VerifyOtp {
                challenge,
                password,
            } => (challenge.email, password),
            other => return Err(wrong_mode("verify_otp", other.mode())),
        };
        let otp = required("OTP", otp)?;
        let _busy = self.begin()?;

        self.api.verify_otp(&email, otp).await?;
        self.set_info(VERIFIED_INFO);
        let response = self.api.login(&email, password.expose()).await?;
        self.authenticate(&response.username)
    }

    async fn resend_inner(&self) -> AuthResult<()> {
        let state = self.state();
        let Some(challenge) = state.challenge() else {
            return Err(wrong_mode("verify_otp|reset_otp", state.mode()));
        };
        if challenge.cooldown_seconds > 0 {
            return Err(AuthError::CooldownActive {
                remaining_seconds: challenge.cooldown_seconds,
            });
        }
        let mode = state.mode();
        let email = challenge.email.as_str();
        let _busy = self.begin()?;

        if mode == AuthMode::VerifyOtp {
            self.api.resend_verify(email).await?;
            self.set_info(VERIFY_RESENT_INFO);
        } else {
            self.api.forgot(email).await?;
            self.set_info(FORGOT_RESENT_INFO);
        }
        self.restart_cooldown(mode, email);
        Ok(())
    }

    async fn forgot_inner(&self, email: &str) -> AuthResult<()> {
        self.expect_mode(AuthMode::Forgot)?;
        let email = required_email(email)?;
        let _busy = self.begin()?;

        self.api.forgot(email).await?;
        self.enter_challenge(AuthState::ResetOtp {
            challenge: OtpChallenge::fresh(email),
        });
        self.set_info(FORGOT_SENT_INFO);
        Ok(())
    }

    async fn reset_inner(&self, otp: &str, new_password: &str) -> AuthResult<String> {
        let email = match self.state() {
            AuthState::ResetOtp { challenge } => challenge.email,
            other => return Err(wrong_mode("reset_otp", other.mode())),
        };
        let otp = required("OTP", otp)?;
        let new_password = required_secret("New password", new_password)?;
        let _busy = self.begin()?;

        self.api.reset(&email, otp, new_password).await?;
        self.set_info(RESET_DONE_INFO);
        let response = self.api.login(&email, new_password).await?;
        self.authenticate(&response.username)
    }

    fn expect_mode(&self, expected: AuthMode) -> AuthResult<()> {
        let actual = self.mode();
        if actual != expected {
            return Err(wrong_mode(expected.as_str(), actual));
        }
        Ok(())
    }

    fn begin(&self) -> AuthResult<BusyGuard<'_>> {
        let guard = BusyGuard::acquire(&self.busy)?;
        *self.messages.borrow_mut() = FlowMessages::default();
        Ok(guard)
    }

    fn set_info(&self, text: &str) {
        self.messages.borrow_mut().info = Some(text.to_string());
    }

    fn enter_challenge(&self, next: AuthState) {
        let from = self.mode();
        *self.state.borrow_mut() = next;
        self.timer.arm(RESEND_COOLDOWN_SECONDS);
        info!(
            "event=auth_transition module=auth status=ok from={from} to={}",
            self.mode()
        );
    }

    /// Restarts the cooldown only if the user is still on the same challenge.
    fn restart_cooldown(&self, mode: AuthMode, email: &str) {
        let restarted = {
            let mut state = self.state.borrow_mut();
            let same_mode = state.mode() == mode;
            match state.challenge_mut() {
                Some(challenge) if same_mode && challenge.email == email => {
                    challenge.cooldown_seconds = RESEND_COOLDOWN_SECONDS;
                    true
                }
                _ => false,
            }
        };
        if restarted {
            self.timer.arm(RESEND_COOLDOWN_SECONDS);
        }
    }

    fn authenticate(&self, identity: &str) -> AuthResult<String> {
        self.api.session().sign_in(identity)?;
        let identity = self.api.session().identity().unwrap_or_default();
        self.timer.disarm();
        let from = self.mode();
        *self.state.borrow_mut() = AuthState::Authenticated {
            identity: identity.clone(),
        };
        info!("event=auth_transition module=auth status=ok from={from} to=authenticated");
        Ok(identity)
    }

    fn settle<T>(&self, op: &'static str, outcome: AuthResult<T>, fallback: &str) -> AuthResult<T> {
        if let Err(err) = &outcome {
            warn!(
                "event=auth_submit module=auth status=error op={op} mode={} error={err}",
                self.mode()
            );
            if !matches!(err, AuthError::Busy) {
                self.messages.borrow_mut().error = Some(err.user_message(fallback));
            }
        }
        outcome
    }
}

fn wrong_mode(expected: &'static str, actual: AuthMode) -> AuthError {
    AuthError::WrongMode { expected, actual }
}
