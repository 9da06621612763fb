use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        email::{Email, Emails, is_email_address},
        query::{UserBody, UserV1Query},
    },
    use_cases::directory::DirectoryConnector,
};

#[async_trait]
pub trait Emailer: Send + Sync {
    async fn send_email(&self, email: &Email, from_address: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct MailUseCases {
    directory: Option<Arc<dyn DirectoryConnector>>,
    emailer: Arc<dyn Emailer>,
    from_email: String,
    to_email: String,
}

impl MailUseCases {
    pub fn new(
        directory: Option<Arc<dyn DirectoryConnector>>,
        emailer: Arc<dyn Emailer>,
        from_email: String,
        to_email: String,
    ) -> Self {
        Self {
            directory,
            emailer,
            from_email,
            to_email,
        }
    }

    /// Resolve, address and send every email in the batch.
    ///
    /// Per-email failures are logged and skipped; the batch as a whole
    /// always succeeds.
    #[instrument(skip(self, emails), fields(count = emails.emails.len()))]
    pub async fn send_emails(&self, emails: Emails) -> AppResult<()> {
        let from_address = match emails.email_sender.as_deref() {
            Some(sender) if !sender.is_empty() => sender.to_string(),
            _ => self.from_email.clone(),
        };

        for mut email in emails.emails {
            if !emails.skip_users_resolution
                && let Err(err) = self.lookup_emails_for_usernames(&mut email).await
            {
                tracing::error!(error = %err, subject = %email.subject, "Error translating usernames");
                continue;
            }

            if email.recipients.is_empty() {
                let fallback = match emails.default_recipient.as_deref() {
                    Some(recipient) if !recipient.is_empty() => recipient.to_string(),
                    _ => self.to_email.clone(),
                };
                email.recipients = vec![fallback];
            }

            if let Err(err) = self.emailer.send_email(&email, &from_address).await {
                tracing::error!(
                    error = %err,
                    subject = %email.subject,
                    recipients = ?email.recipients,
                    "Error sending email"
                );
            }
        }

        Ok(())
    }

    /// Replace bare usernames in the recipient lists with their addresses.
    ///
    /// Makes at most one directory call. Usernames the directory doesn't
    /// know are left as they were.
    pub async fn lookup_emails_for_usernames(&self, email: &mut Email) -> AppResult<()> {
        let to_lookup = usernames_to_lookup(email);
        if to_lookup.is_empty() {
            return Ok(());
        }

        let directory = self
            .directory
            .as_ref()
            .ok_or(AppError::NoDirectoryConfigured)?;

        tracing::info!(
            users_module = %directory.module(),
            usernames = ?to_lookup,
            "Looking up usernames"
        );

        let port = directory.connect().await?;
        let body = UserBody {
            users: to_lookup.into_iter().collect(),
        };
        let users = port.users_by_usernames(&body, &UserV1Query::default()).await?;

        let resolved: HashMap<String, String> = users
            .users
            .into_iter()
            .filter(|user| !user.email.is_empty())
            .map(|user| (user.username, user.email))
            .collect();

        replace_usernames(&mut email.recipients, &resolved);
        replace_usernames(&mut email.cc_list, &resolved);
        replace_usernames(&mut email.bcc_list, &resolved);

        Ok(())
    }
}

/// Unique identifiers across to/cc/bcc that aren't addresses yet.
fn usernames_to_lookup(email: &Email) -> BTreeSet<String> {
    email
        .recipients
        .iter()
        .chain(&email.cc_list)
        .chain(&email.bcc_list)
        .filter(|name| !is_email_address(name))
        .cloned()
        .collect()
}

fn replace_usernames(list: &mut Vec<String>, resolved: &HashMap<String, String>) {
    *list = std::mem::take(list)
        .into_iter()
        .map(|name| resolved.get(&name).cloned().unwrap_or(name))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{modules::UsersModule, user::User, user::Users};
    use crate::test_utils::{RecordingEmailer, StubDirectory};

    fn email(recipients: &[&str], cc: &[&str], bcc: &[&str]) -> Email {
        Email {
            subject: "subject".into(),
            body: "body".into(),
            recipients: recipients.iter().map(|s| s.to_string()).collect(),
            cc_list: cc.iter().map(|s| s.to_string()).collect(),
            bcc_list: bcc.iter().map(|s| s.to_string()).collect(),
            body_type: "html".into(),
        }
    }

    fn mail(directory: Option<StubDirectory>, emailer: Arc<RecordingEmailer>) -> MailUseCases {
        MailUseCases::new(
            directory.map(|d| Arc::new(d) as Arc<dyn DirectoryConnector>),
            emailer,
            "from@example.com".into(),
            "default@example.com".into(),
        )
    }

    fn directory_knowing(names: &[(&str, &str)]) -> StubDirectory {
        let users = names
            .iter()
            .map(|(username, email)| User {
                username: username.to_string(),
                email: email.to_string(),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        let count = users.len();
        StubDirectory::new(UsersModule::Keycloak).with_usernames(Users::new(users, count))
    }

    #[test]
    fn collects_unique_non_address_identifiers() {
        let email = email(&["a@redhat.com", "alice"], &["alice", "bob"], &["carol"]);
        let names: Vec<_> = usernames_to_lookup(&email).into_iter().collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn resolves_usernames_preserving_order() {
        let stub = directory_knowing(&[("alice", "alice@mocked.biz")]);
        let use_cases = mail(Some(stub), Arc::new(RecordingEmailer::default()));

        let mut email = email(&["a@redhat.com", "alice"], &[], &[]);
        use_cases.lookup_emails_for_usernames(&mut email).await.unwrap();

        assert_eq!(email.recipients, vec!["a@redhat.com", "alice@mocked.biz"]);
    }

    #[tokio::test]
    async fn unresolved_usernames_pass_through() {
        let stub = directory_knowing(&[("bob", "bob@example.com")]);
        let use_cases = mail(Some(stub), Arc::new(RecordingEmailer::default()));

        let mut email = email(&["ghost"], &["bob"], &["ghost", "x@y.z"]);
        use_cases.lookup_emails_for_usernames(&mut email).await.unwrap();

        assert_eq!(email.recipients, vec!["ghost"]);
        assert_eq!(email.cc_list, vec!["bob@example.com"]);
        assert_eq!(email.bcc_list, vec!["ghost", "x@y.z"]);
    }

    #[tokio::test]
    async fn addresses_only_make_no_directory_call() {
        let stub = directory_knowing(&[]);
        let calls = stub.calls.clone();
        let use_cases = mail(Some(stub), Arc::new(RecordingEmailer::default()));

        let mut email = email(&["a@redhat.com"], &["b@redhat.com"], &[]);
        use_cases.lookup_emails_for_usernames(&mut email).await.unwrap();

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_without_directory_fails() {
        let use_cases = mail(None, Arc::new(RecordingEmailer::default()));
        let mut email = email(&["alice"], &[], &[]);
        let result = use_cases.lookup_emails_for_usernames(&mut email).await;
        assert!(matches!(result, Err(AppError::NoDirectoryConfigured)));
        assert_eq!(email.recipients, vec!["alice"]);
    }

    #[tokio::test]
    async fn empty_recipients_fall_back_to_configured_default_once() {
        let emailer = Arc::new(RecordingEmailer::default());
        let use_cases = mail(None, emailer.clone());

        let emails = Emails {
            emails: vec![email(&[], &[], &[])],
            ..Default::default()
        };
        use_cases.send_emails(emails).await.unwrap();

        let sent = emailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.recipients, vec!["default@example.com"]);
        assert_eq!(sent[0].1, "from@example.com");
    }

    #[tokio::test]
    async fn default_recipient_and_sender_overrides() {
        let emailer = Arc::new(RecordingEmailer::default());
        let use_cases = mail(None, emailer.clone());

        let emails = Emails {
            emails: vec![email(&[], &[], &[])],
            email_sender: Some("sender@example.com".into()),
            default_recipient: Some("team@example.com".into()),
            skip_users_resolution: false,
        };
        use_cases.send_emails(emails).await.unwrap();

        let sent = emailer.sent();
        assert_eq!(sent[0].0.recipients, vec!["team@example.com"]);
        assert_eq!(sent[0].1, "sender@example.com");
    }

    #[tokio::test]
    async fn failed_lookup_skips_only_that_email() {
        let emailer = Arc::new(RecordingEmailer::default());
        // No directory: any email with a bare username fails to resolve.
        let use_cases = mail(None, emailer.clone());

        let emails = Emails {
            emails: vec![
                email(&["alice"], &[], &[]),
                email(&["b@redhat.com"], &[], &[]),
            ],
            ..Default::default()
        };
        use_cases.send_emails(emails).await.unwrap();

        let sent = emailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.recipients, vec!["b@redhat.com"]);
    }

    #[tokio::test]
    async fn skip_resolution_sends_usernames_verbatim() {
        let emailer = Arc::new(RecordingEmailer::default());
        let use_cases = mail(None, emailer.clone());

        let emails = Emails {
            emails: vec![email(&["alice"], &[], &[])],
            skip_users_resolution: true,
            ..Default::default()
        };
        use_cases.send_emails(emails).await.unwrap();

        assert_eq!(emailer.sent()[0].0.recipients, vec!["alice"]);
    }

    #[tokio::test]
    async fn send_failures_do_not_abort_the_batch() {
        let emailer = Arc::new(RecordingEmailer::failing());
        let use_cases = mail(None, emailer.clone());

        let emails = Emails {
            emails: vec![email(&["a@x.com"], &[], &[]), email(&["b@x.com"], &[], &[])],
            ..Default::default()
        };
        assert!(use_cases.send_emails(emails).await.is_ok());
        assert_eq!(emailer.attempts(), 2);
    }
}
