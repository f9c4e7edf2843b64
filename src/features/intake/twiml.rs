//! Minimal TwiML response builder for the voice and SMS webhooks. Only
//! the four verbs this service emits are supported.

/// Escape the five XML-significant characters
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct TwimlResponse {
    verbs: Vec<String>,
}

impl TwimlResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: &str) -> Self {
        self.verbs.push(format!(
            "<Say language=\"id-ID\">{}</Say>",
            escape(text)
        ));
        self
    }

    pub fn record(mut self, max_length_secs: u32, action: &str) -> Self {
        self.verbs.push(format!(
            "<Record maxLength=\"{}\" action=\"{}\" playBeep=\"true\"/>",
            max_length_secs,
            escape(action)
        ));
        self
    }

    pub fn message(mut self, text: &str) -> Self {
        self.verbs
            .push(format!("<Message>{}</Message>", escape(text)));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push("<Hangup/>".to_string());
        self
    }

    pub fn build(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>{}</Response>",
            self.verbs.join("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_entities() {
        assert_eq!(
            escape(r#"<a & 'b' > "c""#),
            "&lt;a &amp; &apos;b&apos; &gt; &quot;c&quot;"
        );
    }

    #[test]
    fn say_then_hangup() {
        let xml = TwimlResponse::new().say("Terima kasih").hangup().build();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>\
             <Say language=\"id-ID\">Terima kasih</Say><Hangup/></Response>"
        );
    }

    #[test]
    fn record_carries_limit_and_action() {
        let xml = TwimlResponse::new()
            .say("Silakan sampaikan keluhan Anda")
            .record(120, "/webhooks/voice/recording")
            .build();
        assert!(xml.contains("maxLength=\"120\""));
        assert!(xml.contains("action=\"/webhooks/voice/recording\""));
    }

    #[test]
    fn message_body_is_escaped() {
        let xml = TwimlResponse::new().message("Status: <RESOLVED>").build();
        assert!(xml.contains("<Message>Status: &lt;RESOLVED&gt;</Message>"));
    }
}
