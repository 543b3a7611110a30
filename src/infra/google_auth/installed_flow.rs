// One-time browser consent for desktop OAuth clients.
//
// Google redirects back to a loopback listener with `?code=...&state=...`;
// the code is then exchanged for an access token and a refresh token.

use super::credentials::InstalledAppSecrets;
use super::token_source::TokenResponse;
use crate::core::auth::{AuthError, SCOPES};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, Url};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const MAX_REQUEST_HEAD: usize = 8192;

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3>\
<p>You can close this window and return to your application.</p></body></html>";

#[derive(Debug, Default, PartialEq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Runs the consent flow and returns the token response (with refresh token).
pub async fn authorize(
    client: &Client,
    app: &InstalledAppSecrets,
) -> Result<TokenResponse, AuthError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());
    let state = random_state();
    let url = consent_url(app, &redirect_uri, &state)?;

    tracing::info!("Waiting for Google authorization in the browser");
    if let Err(e) = open::that(url.as_str()) {
        tracing::warn!(
            "Could not open a browser ({}). Visit this URL to authorize: {}",
            e,
            url
        );
    }

    let code = wait_for_code(&listener, &state).await?;
    exchange_code(client, app, &code, &redirect_uri).await
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn consent_url(
    app: &InstalledAppSecrets,
    redirect_uri: &str,
    state: &str,
) -> Result<Url, AuthError> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        &app.auth_uri,
        &[
            ("client_id", app.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| AuthError::InvalidCredentials(format!("bad auth_uri: {}", e)))
}

async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String, AuthError> {
    loop {
        let (mut stream, _) = listener.accept().await?;
        let request = read_request_line(&mut stream).await?;

        // Browsers also ask for /favicon.ico and the like.
        let Some(params) = parse_callback(&request) else {
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                .await?;
            continue;
        };

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            SUCCESS_PAGE.len(),
            SUCCESS_PAGE
        );
        stream.write_all(response.as_bytes()).await?;

        return code_from_params(params, expected_state);
    }
}

/// Reads until the request line is complete, the peer stops sending, or the
/// buffer is full. The code in the callback is single-use, so a request line
/// split across TCP segments must not be parsed early.
async fn read_request_line<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<String> {
    let mut buf = vec![0u8; MAX_REQUEST_HEAD];
    let mut filled = 0;

    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if buf[..filled].windows(2).any(|pair| pair == b"\r\n") {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buf[..filled]).into_owned())
}

/// Extracts the OAuth parameters from the request line, if it carries any.
fn parse_callback(request: &str) -> Option<CallbackParams> {
    let target = request.lines().next()?.split_whitespace().nth(1)?;
    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;

    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => params.code = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }

    if params.code.is_none() && params.error.is_none() {
        None
    } else {
        Some(params)
    }
}

fn code_from_params(params: CallbackParams, expected_state: &str) -> Result<String, AuthError> {
    if let Some(error) = params.error {
        return Err(AuthError::Authorization(error));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(AuthError::Authorization(
            "state mismatch in authorization response".to_string(),
        ));
    }
    params
        .code
        .ok_or_else(|| AuthError::Authorization("no authorization code received".to_string()))
}

async fn exchange_code(
    client: &Client,
    app: &InstalledAppSecrets,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse, AuthError> {
    let response = client
        .post(&app.token_uri)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenExchange(format!("{}: {}", status, text)));
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::google_auth::credentials::{DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI};

    fn app() -> InstalledAppSecrets {
        InstalledAppSecrets {
            client_id: "cid.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    #[test]
    fn test_consent_url_parameters() {
        let url = consent_url(&app(), "http://127.0.0.1:4000", "xyz").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(pairs.contains(&("state".to_string(), "xyz".to_string())));
        assert!(pairs.contains(&(
            "scope".to_string(),
            "https://www.googleapis.com/auth/drive https://www.googleapis.com/auth/spreadsheets"
                .to_string()
        )));
    }

    #[test]
    fn test_parse_callback() {
        let request = "GET /?state=abc&code=4%2F0Ad&scope=x HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n";
        let params = parse_callback(request).unwrap();
        assert_eq!(params.code.as_deref(), Some("4/0Ad"));
        assert_eq!(params.state.as_deref(), Some("abc"));

        assert!(parse_callback("GET /favicon.ico HTTP/1.1\r\n\r\n").is_none());
        assert!(parse_callback("").is_none());
    }

    #[tokio::test]
    async fn test_request_line_split_across_reads() {
        let first: &[u8] = b"GET /?state=abc&co";
        let rest: &[u8] = b"de=xyz HTTP/1.1\r\nHost: x\r\n\r\n";
        let mut stream = first.chain(rest);

        let request = read_request_line(&mut stream).await.unwrap();
        let params = parse_callback(&request).unwrap();
        assert_eq!(params.code.as_deref(), Some("xyz"));
        assert_eq!(params.state.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_request_line_stops_at_eof() {
        let mut stream = &b"GET /favicon.ico"[..];
        let request = read_request_line(&mut stream).await.unwrap();
        assert_eq!(request, "GET /favicon.ico");
        assert!(parse_callback(&request).is_none());
    }

    #[test]
    fn test_code_requires_matching_state() {
        let params = CallbackParams {
            code: Some("c".to_string()),
            state: Some("other".to_string()),
            error: None,
        };
        assert!(matches!(
            code_from_params(params, "abc"),
            Err(AuthError::Authorization(_))
        ));

        let params = CallbackParams {
            code: Some("c".to_string()),
            state: Some("abc".to_string()),
            error: None,
        };
        assert_eq!(code_from_params(params, "abc").unwrap(), "c");
    }

    #[test]
    fn test_denied_consent() {
        let params = parse_callback("GET /?error=access_denied&state=abc HTTP/1.1").unwrap();
        match code_from_params(params, "abc") {
            Err(AuthError::Authorization(message)) => assert_eq!(message, "access_denied"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_random_state_shape() {
        let state = random_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
