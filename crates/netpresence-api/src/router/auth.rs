// Router session authentication
//
// Form-based login/logout. A successful login leaves the session cookie
// in the client's jar; every later request carries it automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::router::client::RouterClient;

impl RouterClient {
    /// Authenticate with the router.
    ///
    /// `POST /api/v1/session/login` with form fields `username` and
    /// `password`. Any rejection, HTTP or envelope level, becomes
    /// [`Error::Authentication`].
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("session/login")?;
        debug!(username, "logging in at {}", url);

        let form = [
            ("username", username),
            ("password", password.expose_secret()),
        ];

        match self.post_form::<Value>(url, &form).await {
            Ok(_) => {
                debug!("login successful");
                Ok(())
            }
            Err(Error::RouterApi { message }) => Err(Error::Authentication { message }),
            Err(Error::SessionExpired) => Err(Error::Authentication {
                message: "router refused the credentials".into(),
            }),
            Err(e) => Err(e),
        }
    }

    /// End the current session.
    ///
    /// `POST /api/v1/session/logout`. The router's answer is ignored beyond
    /// transport errors.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("session/logout")?;
        debug!("logging out at {}", url);

        let _resp = self
            .http()
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        debug!("logout complete");
        Ok(())
    }
}
