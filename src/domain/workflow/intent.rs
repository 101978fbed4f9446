//! Intent derivation for confirmation steps.
//!
//! Classification is allowed to be unreliable: anything that fails, comes
//! back unparseable, or is below the confidence floor is treated as the
//! forward-progressing interpretation. Under-detecting a cancellation is
//! the accepted cost of never dead-ending the conversation on a shaky
//! classifier.

use tracing::{debug, info};

use crate::ports::{IntentClassifier, IntentLabel, IntentPrediction};

/// Confidence floor below which a classification is ignored.
pub const MIN_CONFIDENCE: f64 = 0.5;

/// The two intents every confirmation step distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentChoice {
    Cancel,
    Continue,
}

/// Label definition for the cancel intent.
pub const CANCEL_CHOICE: IntentLabel = IntentLabel {
    label: "cancel",
    hint: "The user wants to cancel the flow. Eg. `cancel`, `stop`, `stopp`, \
           and variations of these, also in different languages.",
};

/// Label definition for the continue intent.
pub const CONTINUE_CHOICE: IntentLabel = IntentLabel {
    label: "continue",
    hint: "The user wants to continue. Eg. `continue`, `go on`, `yes`, `ok`, \
           `sounds good`, `let's proceed`, `all good`, and variations of \
           these, also in different languages.",
};

/// Asks the classifier whether the reply cancels or continues the flow.
///
/// Returns [`IntentChoice::Cancel`] only for a confident cancel
/// classification. A continue label, low confidence, an unknown
/// label, or a failed call all continue.
pub async fn derive_intent(
    classifier: &dyn IntentClassifier,
    question: &str,
    user_message: &str,
) -> IntentChoice {
    let prediction = match classifier
        .classify(question, user_message, &[CANCEL_CHOICE, CONTINUE_CHOICE])
        .await
    {
        Ok(prediction) => prediction,
        Err(error) => {
            debug!(%error, "intent classification failed, defaulting to continue");
            return IntentChoice::Continue;
        }
    };

    info!(
        label = %prediction.label,
        confidence = prediction.confidence,
        "intent derived"
    );

    match prediction {
        IntentPrediction { label, confidence }
            if label == CANCEL_CHOICE.label && confidence >= MIN_CONFIDENCE =>
        {
            IntentChoice::Cancel
        }
        _ => IntentChoice::Continue,
    }
}
