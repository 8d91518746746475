//! Celebration core: first-login flag policy, the auth seam and the wish/plan event feed.

pub mod auth;
pub mod celebration;
pub mod first_login;

pub use auth::{AuthProvider, AuthSession, LocalAuthProvider, RegistrationForm};
pub use celebration::{run_first_login_sequence, CelebrationEvent, CelebrationFeed, Submission};
pub use first_login::{CelebrationTicket, FirstLoginController};
