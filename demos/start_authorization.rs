//! Builds a client from host settings and prints the authorization URL an end-user must visit.

// std
use std::collections::HashMap;
// crates.io
use color_eyre::Result;
// self
use market_oauth2_client::{
	config::{ClientConfig, source},
	flows::MarketClient,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let settings = HashMap::from([
		(source::API_BASE_URL.to_owned(), "https://api.example.com/v3/".to_owned()),
		(source::CLIENT_ID.to_owned(), "demo-client".to_owned()),
		(source::CLIENT_SECRET.to_owned(), "demo-secret".to_owned()),
		(source::APP_REDIRECT_URI.to_owned(), "https://app.example.com/callback".to_owned()),
		(source::APP_USER_AGENT.to_owned(), "demo-app/0.1".to_owned()),
	]);
	let config = ClientConfig::from_source(&settings)?;
	let client = MarketClient::new(config)?;
	let session = client.start_authorization()?;

	println!("Send your user to {}.", &session.authorize_url);
	println!("Keep state `{}` for the redirect handler.", &session.state);

	let mut sessions = HashMap::new();

	sessions.insert(session.state.clone(), session.clone());

	// Simulate the redirect handler looking up the stored session by `state`.
	let returned_state = session.state.clone();

	if let Some(stashed) = sessions.remove(&returned_state) {
		stashed.validate_state(&returned_state)?;
		println!("State validated; call MarketClient::exchange_session with the returned code.");
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
