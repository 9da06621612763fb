use serde::{Deserialize, Serialize};

/// One outbound message. Recipient lists hold either email addresses or bare
/// usernames that still need resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub cc_list: Vec<String>,
    #[serde(default)]
    pub bcc_list: Vec<String>,
    #[serde(default)]
    pub body_type: String,
}

/// Batch payload accepted by the send-emails endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emails {
    #[serde(default)]
    pub emails: Vec<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_recipient: Option<String>,
    #[serde(default)]
    pub skip_users_resolution: bool,
}

/// Identifiers containing `@` are treated as addresses already.
pub fn is_email_address(identifier: &str) -> bool {
    identifier.contains('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_payload_uses_camel_case() {
        let emails: Emails = serde_json::from_str(
            r#"{
                "emails": [{"subject":"s","body":"b","recipients":["a"],"ccList":["c"],"bccList":[],"bodyType":"html"}],
                "emailSender": "noreply@example.com",
                "skipUsersResolution": true
            }"#,
        )
        .unwrap();

        assert_eq!(emails.emails[0].cc_list, vec!["c"]);
        assert_eq!(emails.emails[0].body_type, "html");
        assert_eq!(emails.email_sender.as_deref(), Some("noreply@example.com"));
        assert!(emails.default_recipient.is_none());
        assert!(emails.skip_users_resolution);
    }

    #[test]
    fn address_detection() {
        assert!(is_email_address("a@redhat.com"));
        assert!(!is_email_address("alice"));
    }
}
