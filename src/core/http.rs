use reqwest::Client;

// GitHub's API rejects requests without a user agent.
const APP_USER_AGENT: &str = "HornetModManager/0.1.0";

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(APP_USER_AGENT).build()
}
