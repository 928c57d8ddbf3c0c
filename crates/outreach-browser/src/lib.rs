mod chrome_finder;
mod error;
mod launcher;
mod login;
mod profile;
mod session;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use launcher::ChromeLauncher;
pub use login::Credentials;
pub use profile::ProfileManager;
pub use session::BrowserSession;
