use anyhow::Result;

use super::Server;

/// Routes one client notification to the first matching handler. There is
/// no reply to carry a failure, so every failure ends up in the log.
pub(crate) struct NotificationDispatcher<'me> {
    notification: Option<lsp_server::Notification>,
    server: &'me mut Server,
}

impl<'me> NotificationDispatcher<'me> {
    pub(crate) fn new(notification: lsp_server::Notification, server: &'me mut Server) -> Self {
        // Only `exit` is meaningful after `shutdown`, and the loop takes that itself.
        if server.shutdown_requested {
            tracing::debug!(method = %notification.method, "notification after shutdown dropped");
            return Self { notification: None, server };
        }

        Self { notification: Some(notification), server }
    }

    pub(crate) fn on<N>(&mut self, handler: fn(&mut Server, N::Params) -> Result<()>) -> &mut Self
    where
        N: lsp_types::notification::Notification,
    {
        let Some(notification) = self.notification.take() else {
            return self;
        };

        let params = match notification.extract::<N::Params>(N::METHOD) {
            Ok(params) => params,
            Err(lsp_server::ExtractError::MethodMismatch(notification)) => {
                self.notification = Some(notification);
                return self;
            }
            Err(lsp_server::ExtractError::JsonError { method, error }) => {
                tracing::error!(%method, %error, "malformed notification params");
                return self;
            }
        };

        let _span = tracing::debug_span!("notification", method = N::METHOD).entered();
        if let Err(error) = handler(self.server, params) {
            tracing::error!("{error:#}");
        }

        self
    }

    pub(crate) fn finish(&mut self) {
        let Some(notification) = self.notification.take() else { return };

        // `$/` notifications are optional for a server.
        if notification.method.starts_with("$/") {
            tracing::debug!(method = %notification.method, "optional notification ignored");
        } else {
            tracing::warn!(method = %notification.method, "unhandled notification");
        }
    }
}
