pub mod auth;
pub mod dicom;
pub mod hospital;

use anyhow::anyhow;
use medconsole_client::{ClientError, Navigator, Route, SessionStore, require_session};

use crate::output::print_validation;

/// Converts a client error for the top-level reporter, listing field
/// errors first.
pub(crate) fn report(err: ClientError) -> anyhow::Error {
    if let ClientError::Validation(errors) = &err {
        print_validation(errors);
        return anyhow!("{} field(s) need attention", errors.len());
    }
    err.into()
}

/// Fails unless a session exists for a protected route.
pub(crate) fn guard(
    session: &SessionStore,
    navigator: &dyn Navigator,
    route: &Route,
) -> anyhow::Result<()> {
    if require_session(session, navigator, route) {
        Ok(())
    } else {
        Err(anyhow!("Authentication required for {route}"))
    }
}
