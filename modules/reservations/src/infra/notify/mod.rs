pub mod dispatcher;
pub mod http_notifier;

pub use dispatcher::NotificationDispatcher;
pub use http_notifier::HttpStatusNotifier;
