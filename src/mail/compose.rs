//! Canned introduction email

/// Name used when the caller gives none
pub const DEFAULT_SENDER_NAME: &str = "Yasir Aquil";

/// Subject and body of an introduction email.
///
/// `custom_message`, when non-empty, becomes its own paragraph right before
/// the closing paragraphs. The signature is the name followed by the sending
/// account.
pub fn compose_introduction(name: &str, custom_message: &str, account: &str) -> (String, String) {
    let subject = format!("Introduction - {}", name);

    let custom = if custom_message.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", custom_message)
    };

    let body = format!(
        "Dear Recipient,

I hope this email finds you well. I'm writing to introduce myself - I'm {name}, and I wanted to reach out to connect with you.

{custom}I'm a software engineer with experience in various programming technologies including JavaScript, React, and web development. I'm always interested in discussing potential opportunities for collaboration or simply connecting professionally.

Thank you for your time, and I look forward to hearing from you.

Best regards,
{name}
{account}"
    );

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_introduction() {
        let (subject, body) = compose_introduction(DEFAULT_SENDER_NAME, "", "me@example.com");
        assert_eq!(subject, "Introduction - Yasir Aquil");
        assert!(body.contains("I'm Yasir Aquil, and I wanted"));
        assert!(body.contains(
            "connect with you.\n\nI'm a software engineer"
        ));
        assert!(body.ends_with("Best regards,\nYasir Aquil\nme@example.com"));
    }

    #[test]
    fn test_custom_paragraph() {
        let (_, body) = compose_introduction("Sam", "Hi there", "me@example.com");
        assert!(body.contains("Hi there\n\nI'm a software engineer"));
        assert!(body.contains("I'm Sam,"));
    }
}
