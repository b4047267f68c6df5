/// The slash-command fields feedhorn consumes from the form body.
///
/// Slack sends more fields (team, channel, trigger ids); unknown keys are
/// ignored and missing keys default to empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlashPayload {
    pub user_id: String,
    pub text: String,
}

impl SlashPayload {
    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Decoding happens strictly after signature verification so the raw
    /// bytes the signature covers are never re-encoded.
    pub fn from_form_bytes(raw: &[u8]) -> Self {
        let mut payload = Self::default();

        for pair in raw.split(|&byte| byte == b'&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = match pair.iter().position(|&byte| byte == b'=') {
                Some(index) => (&pair[..index], &pair[index + 1..]),
                None => (pair, &[][..]),
            };

            match decode_component(key).as_str() {
                "user_id" => payload.user_id = decode_component(value),
                "text" => payload.text = decode_component(value),
                _ => {}
            }
        }

        payload
    }
}

fn decode_component(value: &[u8]) -> String {
    let mut decoded = Vec::with_capacity(value.len());
    let mut index = 0usize;

    while index < value.len() {
        match value[index] {
            b'+' => {
                decoded.push(b' ');
                index += 1;
            }
            b'%' if index + 2 < value.len() => {
                match (hex_nibble(value[index + 1]), hex_nibble(value[index + 2])) {
                    (Some(high), Some(low)) => {
                        decoded.push((high << 4) | low);
                        index += 3;
                    }
                    // Invalid escape sequences pass through verbatim.
                    _ => {
                        decoded.push(b'%');
                        index += 1;
                    }
                }
            }
            byte => {
                decoded.push(byte);
                index += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::SlashPayload;

    #[test]
    fn decodes_user_and_text_fields() {
        let payload =
            SlashPayload::from_form_bytes(b"user_id=U123&text=subscribe+news+http%3A%2F%2Fx");

        assert_eq!(payload.user_id, "U123");
        assert_eq!(payload.text, "subscribe news http://x");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let payload = SlashPayload::from_form_bytes(
            b"token=abc&team_id=T1&user_id=U1&text=list&trigger_id=42",
        );

        assert_eq!(payload.user_id, "U1");
        assert_eq!(payload.text, "list");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let payload = SlashPayload::from_form_bytes(b"team_id=T1");

        assert_eq!(payload.user_id, "");
        assert_eq!(payload.text, "");
    }

    #[test]
    fn plus_signs_decode_to_spaces_only_in_values_and_keys() {
        let payload = SlashPayload::from_form_bytes(b"user_id=U1&text=fetch+news+5");
        assert_eq!(payload.text, "fetch news 5");
    }

    #[test]
    fn invalid_percent_escapes_pass_through() {
        let payload = SlashPayload::from_form_bytes(b"user_id=U1&text=100%+done%2");

        assert_eq!(payload.text, "100% done%2");
    }

    #[test]
    fn empty_body_yields_empty_payload() {
        assert_eq!(SlashPayload::from_form_bytes(b""), SlashPayload::default());
    }

    #[test]
    fn valueless_keys_are_tolerated() {
        let payload = SlashPayload::from_form_bytes(b"text&user_id=U1");

        assert_eq!(payload.user_id, "U1");
        assert_eq!(payload.text, "");
    }
}
