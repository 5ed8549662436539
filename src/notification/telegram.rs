//! Telegram Bot API delivery.
//!
//! Text goes through `sendMessage` on the retrying JSON client. Images go
//! through `sendPhoto` as a multipart upload on a plain client, because a
//! streamed multipart body cannot be replayed by the retry middleware.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use super::{
    Destination, Notifier, error::NotificationError, payload_builder::TelegramPayloadBuilder,
};
use crate::config::TelegramConfig;

/// Telegram rejects photo captions longer than this many characters.
pub const CAPTION_LIMIT: usize = 1024;

/// The envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// A [`Notifier`] that posts to a Telegram chat through a bot.
pub struct TelegramNotifier {
    client: Arc<ClientWithMiddleware>,
    upload_client: reqwest::Client,
    /// `<api_url>/bot<token>`. Errors built from requests to it have the URL
    /// stripped, see [`NotificationError`].
    method_base: String,
    chat_id: String,
    builder: TelegramPayloadBuilder,
}

impl TelegramNotifier {
    /// Creates a notifier for the configured bot.
    pub fn new(
        config: &TelegramConfig,
        client: Arc<ClientWithMiddleware>,
        upload_client: reqwest::Client,
    ) -> Self {
        let method_base =
            format!("{}/bot{}", config.api_url.as_str().trim_end_matches('/'), config.token);
        Self {
            client,
            upload_client,
            method_base,
            chat_id: config.chat_id.clone(),
            builder: TelegramPayloadBuilder { disable_web_preview: config.disable_web_preview },
        }
    }

    fn chat_id<'a>(&'a self, destination: &'a Destination) -> &'a str {
        match destination {
            Destination::Default => &self.chat_id,
            Destination::Chat(chat_id) => chat_id,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.method_base, method)
    }

    fn check_response(
        method: &str,
        status: reqwest::StatusCode,
        body: &[u8],
    ) -> Result<(), NotificationError> {
        let parsed: Option<ApiResponse> = serde_json::from_slice(body).ok();
        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description, .. }) => Err(NotificationError::NotifyFailed(format!(
                "{method} failed with status {status}: {}",
                description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(NotificationError::NotifyFailed(format!(
                "{method} failed with status {status}: unexpected response body"
            ))),
        }
    }

    async fn upload_photo(
        &self,
        chat_id: &str,
        image: &[u8],
        caption: &str,
    ) -> Result<(), NotificationError> {
        let part = Part::bytes(image.to_vec()).file_name("snapshot.png").mime_str("image/png")?;
        let form = self
            .builder
            .photo_fields(chat_id, caption)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part("photo", part);

        let response =
            self.upload_client.post(self.method_url("sendPhoto")).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Self::check_response("sendPhoto", status, &body)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(
        &self,
        destination: &Destination,
        text: &str,
    ) -> Result<(), NotificationError> {
        let chat_id = self.chat_id(destination);
        let payload = self.builder.message(chat_id, text);

        let response =
            self.client.post(self.method_url("sendMessage")).json(&payload).send().await?;
        let status = response.status();
        let body = response.bytes().await.map_err(reqwest_middleware::Error::from)?;
        Self::check_response("sendMessage", status, &body)?;

        tracing::debug!(chat_id, chars = text.chars().count(), "Telegram message sent.");
        Ok(())
    }

    async fn send_photo(
        &self,
        destination: &Destination,
        image: &[u8],
        caption: &str,
    ) -> Result<(), NotificationError> {
        let chat_id = self.chat_id(destination);

        if caption.chars().count() > CAPTION_LIMIT {
            // Delivered once the text is out; the image is best-effort.
            tracing::debug!(chat_id, "Caption too long, sending it as a separate message.");
            self.send_text(destination, caption).await?;
            if let Err(e) = self.upload_photo(chat_id, image, "").await {
                tracing::warn!(chat_id, error = %e, "Text delivered, snapshot upload failed.");
            }
            return Ok(());
        }

        self.upload_photo(chat_id, image, caption).await?;
        tracing::debug!(chat_id, bytes = image.len(), "Telegram photo sent.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::test_helpers::create_test_http_client;

    const TOKEN: &str = "123:abc";

    fn notifier_for(server: &mockito::Server) -> TelegramNotifier {
        let config = TelegramConfig {
            token: TOKEN.to_string(),
            chat_id: "-1001".to_string(),
            operations_chat_id: Some("-2002".to_string()),
            api_url: Url::parse(&server.url()).unwrap(),
            disable_web_preview: true,
            retry_policy: Default::default(),
        };
        TelegramNotifier::new(&config, create_test_http_client(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_send_text_to_default_chat() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", format!("/bot{TOKEN}/sendMessage").as_str())
            .match_body(Matcher::Json(json!({
                "chat_id": "-1001",
                "text": "*Pollution limit exceeded*\nNO2: 150% of limit",
                "parse_mode": "MarkdownV2",
                "disable_web_page_preview": true
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .create_async()
            .await;

        let result = notifier_for(&server)
            .send_text(&Destination::Default, "*Pollution limit exceeded*\nNO2: 150% of limit")
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_text_to_explicit_chat() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", format!("/bot{TOKEN}/sendMessage").as_str())
            .match_body(Matcher::PartialJson(json!({ "chat_id": "-2002" })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .create_async()
            .await;

        let result = notifier_for(&server)
            .send_text(&Destination::Chat("-2002".to_string()), "Cycle failed")
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_text_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", format!("/bot{TOKEN}/sendMessage").as_str())
            .with_status(400)
            .with_body(
                r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
            )
            .create_async()
            .await;

        let result = notifier_for(&server).send_text(&Destination::Default, "hello").await;

        let err = result.unwrap_err();
        assert!(matches!(err, NotificationError::NotifyFailed(_)));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_send_photo_with_caption() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", format!("/bot{TOKEN}/sendPhoto").as_str())
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("name=\"chat_id\"".to_string()),
                Matcher::Regex("-1001".to_string()),
                Matcher::Regex("name=\"caption\"".to_string()),
                Matcher::Regex("filename=\"snapshot.png\"".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .create_async()
            .await;

        let result = notifier_for(&server)
            .send_photo(&Destination::Default, b"png-bytes", "*Pollution is over*")
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    fn unreachable_notifier() -> TelegramNotifier {
        let config = TelegramConfig {
            token: TOKEN.to_string(),
            chat_id: "-1001".to_string(),
            operations_chat_id: None,
            api_url: Url::parse("http://127.0.0.1:1").unwrap(),
            disable_web_preview: true,
            retry_policy: Default::default(),
        };
        TelegramNotifier::new(&config, create_test_http_client(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_connection_error_does_not_expose_token() {
        let err = unreachable_notifier()
            .send_text(&Destination::Default, "hello")
            .await
            .unwrap_err();

        assert!(!err.to_string().contains(TOKEN), "token leaked: {err}");
    }

    #[tokio::test]
    async fn test_upload_error_does_not_expose_token() {
        let err = unreachable_notifier()
            .send_photo(&Destination::Default, b"png-bytes", "caption")
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::UploadError(_)));
        assert!(!err.to_string().contains(TOKEN), "token leaked: {err}");
    }

    #[tokio::test]
    async fn test_long_caption_failed_photo_still_delivers() {
        let mut server = mockito::Server::new_async().await;
        let text = server
            .mock("POST", format!("/bot{TOKEN}/sendMessage").as_str())
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .expect(1)
            .create_async()
            .await;
        let photo = server
            .mock("POST", format!("/bot{TOKEN}/sendPhoto").as_str())
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: wrong file"}"#)
            .expect(1)
            .create_async()
            .await;

        let caption = "x".repeat(CAPTION_LIMIT + 1);
        let result =
            notifier_for(&server).send_photo(&Destination::Default, b"png-bytes", &caption).await;

        assert!(result.is_ok());
        text.assert_async().await;
        photo.assert_async().await;
    }

    #[tokio::test]
    async fn test_long_caption_failed_text_skips_photo() {
        let mut server = mockito::Server::new_async().await;
        let _text = server
            .mock("POST", format!("/bot{TOKEN}/sendMessage").as_str())
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: message is too long"}"#)
            .create_async()
            .await;
        let photo = server
            .mock("POST", format!("/bot{TOKEN}/sendPhoto").as_str())
            .expect(0)
            .create_async()
            .await;

        let caption = "x".repeat(CAPTION_LIMIT + 1);
        let result =
            notifier_for(&server).send_photo(&Destination::Default, b"png-bytes", &caption).await;

        assert!(matches!(result, Err(NotificationError::NotifyFailed(_))));
        photo.assert_async().await;
    }

    #[tokio::test]
    async fn test_long_caption_is_sent_separately() {
        let mut server = mockito::Server::new_async().await;
        let photo = server
            .mock("POST", format!("/bot{TOKEN}/sendPhoto").as_str())
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .expect(1)
            .create_async()
            .await;
        let text = server
            .mock("POST", format!("/bot{TOKEN}/sendMessage").as_str())
            .match_body(Matcher::PartialJson(json!({ "text": "x".repeat(CAPTION_LIMIT + 1) })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let caption = "x".repeat(CAPTION_LIMIT + 1);
        let result =
            notifier_for(&server).send_photo(&Destination::Default, b"png-bytes", &caption).await;

        assert!(result.is_ok());
        photo.assert_async().await;
        text.assert_async().await;
    }
}
