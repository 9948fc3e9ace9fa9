use crate::base::neterror::NetError;
use crate::dom::Document;
use crate::http::requestbody::FormData;
use crate::urlrequest::request::RequestMethod;
use scraper::Selector;
use url::Url;

/// Field that receives the account identity.
const IDENTITY_FIELD: &str = "Email";
/// Field removed so the login does not ask for a persistent session.
const PERSISTENT_FIELD: &str = "PersistentCookie";

/// One `<input>` as found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub value: String,
    /// Lowercased `type` attribute, `text` when absent.
    pub kind: String,
}

/// A filled login form, ready to submit.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub action: Url,
    pub method: RequestMethod,
    pub inputs: Vec<FormInput>,
    pub payload: FormData,
}

impl LoginForm {
    /// Find the first form carrying both `action` and `method` and fill it
    /// with `identity` and `secret`.
    pub fn extract(doc: &Document, identity: &str, secret: &str) -> Result<Self, NetError> {
        let missing = || NetError::LoginFormMissing {
            url: doc.url().to_string(),
        };
        let (Ok(form_sel), Ok(input_sel)) = (
            Selector::parse("form[action][method]"),
            Selector::parse("input[name]"),
        ) else {
            return Err(missing());
        };

        let html = doc.html();
        let form = html.select(&form_sel).next().ok_or_else(missing)?;

        let raw_action = form.value().attr("action").unwrap_or_default();
        let action = doc
            .url()
            .join(raw_action)
            .map_err(|_| NetError::InvalidUrl)?;
        let method = match form.value().attr("method") {
            Some(m) if m.trim().eq_ignore_ascii_case("get") => RequestMethod::Get,
            _ => RequestMethod::Post,
        };

        let inputs: Vec<FormInput> = form
            .select(&input_sel)
            .filter_map(|input| {
                let el = input.value();
                Some(FormInput {
                    name: el.attr("name")?.to_string(),
                    value: el.attr("value").unwrap_or_default().to_string(),
                    kind: el
                        .attr("type")
                        .map(|t| t.trim().to_ascii_lowercase())
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| "text".to_string()),
                })
            })
            .collect();

        let mut payload = FormData::new();
        for input in &inputs {
            let value = if input.name == IDENTITY_FIELD || input.kind == "email" {
                identity
            } else if input.kind == "password" {
                secret
            } else {
                input.value.as_str()
            };
            payload.set(input.name.as_str(), value);
        }
        payload.remove(PERSISTENT_FIELD);

        tracing::debug!(
            action = %action,
            method = %method,
            fields = payload.len(),
            "extracted login form"
        );

        Ok(Self {
            action,
            method,
            inputs,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"<html><body>
        <form id="search" action="/search"><input name="q"></form>
        <form action="ServiceLoginAuth?hl=en" method="post">
            <input type="hidden" name="continue" value="https://mail.google.com/mail/">
            <input type="hidden" name="GALX" value="tok">
            <input type="email" name="Email" value="">
            <input type="PASSWORD" name="Passwd">
            <input type="checkbox" name="PersistentCookie" value="yes" checked>
            <input type="submit" value="Sign in">
        </form>
    </body></html>"#;

    fn login_doc() -> Document {
        Document::new(
            Url::parse("https://accounts.google.com/ServiceLogin?service=mail").unwrap(),
            LOGIN_PAGE,
        )
    }

    #[test]
    fn test_extract_fills_identity_and_secret() {
        let form = LoginForm::extract(&login_doc(), "user@gmail.com", "s3cret").unwrap();
        assert_eq!(form.method, RequestMethod::Post);
        assert_eq!(
            form.action.as_str(),
            "https://accounts.google.com/ServiceLoginAuth?hl=en"
        );
        assert_eq!(form.payload.get("Email"), Some("user@gmail.com"));
        assert_eq!(form.payload.get("Passwd"), Some("s3cret"));
        assert_eq!(form.payload.get("GALX"), Some("tok"));
        assert!(!form.payload.contains("PersistentCookie"));
        assert_eq!(form.payload.len(), 4);
    }

    #[test]
    fn test_input_kinds_normalized() {
        let form = LoginForm::extract(&login_doc(), "u", "p").unwrap();
        let kinds: Vec<_> = form.inputs.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["hidden", "hidden", "email", "password", "checkbox"]);
    }

    #[test]
    fn test_get_form_and_identity_by_type() {
        let doc = Document::new(
            Url::parse("https://www.google.com/a/example.com/LoginAction2").unwrap(),
            r#"<form action="https://www.google.com/a/example.com/Login" method="GET">
                <input name="login" type="email"><input name="pw" type="password"></form>"#,
        );
        let form = LoginForm::extract(&doc, "alice", "pw").unwrap();
        assert_eq!(form.method, RequestMethod::Get);
        assert_eq!(form.payload.get("login"), Some("alice"));
        assert_eq!(form.payload.get("pw"), Some("pw"));
    }

    #[test]
    fn test_missing_form() {
        let doc = Document::new(
            Url::parse("https://accounts.google.com/ServiceLogin").unwrap(),
            "<form action='/x'><input name='a'></form>",
        );
        assert_eq!(
            LoginForm::extract(&doc, "u", "p").unwrap_err(),
            NetError::LoginFormMissing {
                url: "https://accounts.google.com/ServiceLogin".into()
            }
        );
    }
}
