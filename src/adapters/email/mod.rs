use std::sync::Arc;

use crate::{domain::entities::modules::MailerModule, use_cases::mail::Emailer};

pub mod print;

pub fn emailer_for(module: MailerModule) -> Arc<dyn Emailer> {
    match module {
        MailerModule::Print => Arc::new(print::PrintEmailer),
    }
}
