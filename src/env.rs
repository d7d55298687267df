use serde::Deserialize;
use std::env;

use dotenv::dotenv;

use crate::peer::request_id::IdSource;

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(rename = "PEER_NAME")]
    pub peer_name: String,

    #[serde(rename = "PEER_ID_MODE")]
    pub peer_id_mode: String,
}

fn default_peer_name() -> String {
    "peer".to_string()
}

fn default_id_mode() -> String {
    "random".to_string()
}

impl Config {
    pub fn load() -> Self {
        dotenv().ok();
        Config {
            peer_name: env::var("PEER_NAME").unwrap_or_else(|_| default_peer_name()),
            peer_id_mode: env::var("PEER_ID_MODE").unwrap_or_else(|_| default_id_mode()),
        }
    }

    /// Maps the configured mode onto an identifier source. Anything other
    /// than "sequential" falls back to the random source.
    pub fn id_source(&self) -> IdSource {
        if self.peer_id_mode.eq_ignore_ascii_case("sequential") {
            IdSource::sequential()
        } else {
            IdSource::Random
        }
    }
}
