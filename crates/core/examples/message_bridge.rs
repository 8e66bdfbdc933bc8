//! Bridges
//!
//! Run with: cargo run -p composable-core --example message_bridge
//!
//! Two message kinds (email, SMS) and two senders (normal, encrypted) vary
//! independently: any message can go out through any sender, and the sender
//! can be swapped on a live message.

use std::sync::Arc;

use composable_core::{
    Abstraction, Append, Bridge, Component, ComponentExt, EngineError, Rebind,
};

// ============================================================================
// Implementors
// ============================================================================

trait Sender: Send + Sync {
    fn send(&self, message: &str, receiver: &str) -> String;
}

struct NormalSender;

impl Sender for NormalSender {
    fn send(&self, message: &str, receiver: &str) -> String {
        format!("Sending '{}' to {}", message, receiver)
    }
}

struct EncryptedSender;

impl Sender for EncryptedSender {
    fn send(&self, message: &str, receiver: &str) -> String {
        let scrambled: String = message.chars().rev().collect();
        format!("Sending encrypted '{}' to {}", scrambled, receiver)
    }
}

// ============================================================================
// Abstractions
// ============================================================================

struct EmailMessage {
    receiver: String,
}

impl Abstraction<dyn Sender> for EmailMessage {
    type Output = String;

    fn operation(&self, sender: &dyn Sender) -> Result<String, EngineError> {
        Ok(sender.send("Meeting at 9", &self.receiver))
    }

    fn name(&self) -> &str {
        "EmailMessage"
    }
}

struct SmsMessage {
    number: String,
}

impl Abstraction<dyn Sender> for SmsMessage {
    type Output = String;

    fn operation(&self, sender: &dyn Sender) -> Result<String, EngineError> {
        if self.number.is_empty() {
            return Err(EngineError::evaluation("SmsMessage", "no phone number"));
        }
        Ok(sender.send("Running late", &self.number))
    }

    fn name(&self) -> &str {
        "SmsMessage"
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), EngineError> {
    println!("=== Bridges ===\n");

    let normal: Arc<dyn Sender> = Arc::new(NormalSender);
    let encrypted: Arc<dyn Sender> = Arc::new(EncryptedSender);

    let email = Bridge::new(
        EmailMessage {
            receiver: "alice@example.com".into(),
        },
        Arc::clone(&normal),
    );
    let sms = Bridge::new(
        SmsMessage {
            number: "+15550100".into(),
        },
        Arc::clone(&encrypted),
    );

    println!("{}", email.operation()?);
    println!("{}", sms.operation()?);

    email.set_implementor(Arc::clone(&encrypted))?;
    println!("after rebind: {}", email.operation()?);

    let signed = email.decorate(Append::new(" [signed]"));
    println!("decorated: {}", signed.operation()?);

    match signed.set_implementor(normal) {
        Ok(()) => println!("unexpected: decorator rebound"),
        Err(e) => println!("rebinding a decorator: {}", e),
    }

    Ok(())
}
