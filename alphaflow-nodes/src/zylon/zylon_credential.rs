// src/zylon/zylon_credential.rs

use crate::credential::CredentialDescriptor;
use crate::params::{InputParam, ParamType};

pub const ZYLON_API_CREDENTIAL: &str = "zylonApi";
/// Field of the credential record holding the secret.
pub const ZYLON_API_KEY_PARAM: &str = "zylonApiKey";

/// Schema of the stored Zylon API key.
pub struct ZylonApiCredential;

impl ZylonApiCredential {
    pub fn descriptor() -> CredentialDescriptor {
        CredentialDescriptor {
            name: ZYLON_API_CREDENTIAL.to_string(),
            label: "Zylon API".to_string(),
            version: 1.0,
            description: "Refer to <a target=\"_blank\" href=\"https://docs.zylon.ai/api-reference/zylon-gpt-api\">official guide</a> on how to get accessToken for Zylon".to_string(),
            inputs: vec![InputParam::new("API Key", ZYLON_API_KEY_PARAM, ParamType::Password)
                .with_placeholder("<ZYLON_API_KEY>")],
        }
    }
}
