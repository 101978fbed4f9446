//! Sales workflow: from first contact to a paid liability policy.
//!
//! Six phases, mirroring the conversation: risk data collection and
//! quote, quote presentation, underwriting questions, personal data,
//! review and policy draft, payment. Every phase is a nested workflow so
//! its suspensions stay local to it.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::shared::ConfirmStep;
use super::WorkflowToolkit;
use crate::domain::collection::{
    merge, CollectionOutcome, FieldKey, HybridCollector,
};
use crate::domain::foundation::Timestamp;
use crate::domain::insurance::{Customer, CustomerValues, PaymentOrder, PolicyDraftOrder, QuoteRequest, TariffPackage};
use crate::domain::workflow::{
    predicate, CollectStep, EntryPhase, Message, RunContext, StepData, StepError, StepId,
    StepNode, StepOutcome, SuspendPayload, WorkflowBuilder, WorkflowDefinition, WorkflowId,
    WorkflowStep, MIN_CONFIDENCE,
};
use crate::ports::{InsuranceApi, IntentClassifier, IntentLabel};

const PRODUCT_NAME: &str = "privateLiability";
const PAYMENT_SCHEDULE: &str = "monthly";
/// Zip used for quoting before the address is collected.
const QUOTE_FALLBACK_ZIP: &str = "12345";

const DETAILS_LABEL: IntentLabel = IntentLabel {
    label: "details",
    hint: "The message asks for details, a comparison, what's included, \
           limits, exclusions, or clarification. Eg. `details`, `more info`, \
           `what exactly`, `compare`, also in other languages.",
};

const CONTINUE_LABEL: IntentLabel = IntentLabel {
    label: "continue",
    hint: "The message is only a continue/acknowledgement. Eg. `continue`, \
           `go on`, `yes`, `ok`, `sounds good`, `let's proceed`, also in \
           other languages. This is the default when the user does not ask \
           for details.",
};

/// Calculates the quote once date of birth and coverage scope are known.
struct FetchQuoteStep {
    api: Arc<dyn InsuranceApi>,
}

#[async_trait]
impl WorkflowStep for FetchQuoteStep {
    fn id(&self) -> StepId {
        StepId::FetchQuote
    }

    fn max_attempts(&self) -> u32 {
        3
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let collection = &input.data_collection;
        let request = QuoteRequest {
            product_name: PRODUCT_NAME.to_string(),
            package: TariffPackage::M,
            zip_code: collection
                .zip_code
                .clone()
                .unwrap_or_else(|| QUOTE_FALLBACK_ZIP.to_string()),
            date_of_birth: collection
                .date_of_birth
                .clone()
                .ok_or(StepError::MissingData("date of birth"))?,
            coverage_scope: collection
                .coverage_scope
                .ok_or(StepError::MissingData("coverage scope"))?,
            payment_schedule: PAYMENT_SCHEDULE.to_string(),
        };

        let quote = self.api.fetch_quote(&request).await?;
        info!(quote_id = %quote.quote_id, gross = quote.gross, "quote fetched");

        input.quote = Some(quote);
        input.completed = true;
        Ok(StepOutcome::Continue(input))
    }
}

/// Presents the quote; a reply asking for details triggers one follow-up.
struct QuotePresentationStep {
    intent: Arc<dyn IntentClassifier>,
}

impl QuotePresentationStep {
    fn price_text(&self, input: &StepData) -> String {
        let gross = input.quote.as_ref().map(|q| q.gross).unwrap_or(0.0);
        format!("Your monthly premium would be {gross:.2} EUR. Shall we continue?")
    }
}

#[async_trait]
impl WorkflowStep for QuotePresentationStep {
    fn id(&self) -> StepId {
        StepId::QuotePresentation
    }

    async fn execute(
        &self,
        mut input: StepData,
        phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let question = self.price_text(&input);
        let Some(resume) = phase.resume() else {
            return Ok(StepOutcome::Suspend(SuspendPayload::user_input(
                input.data_collection.clone(),
                vec![Message::text(question)],
            )));
        };

        // Anything but a clear request for details moves on; a shaky
        // classification must not loop the user through the follow-up.
        input.completed = match self
            .intent
            .classify(
                &question,
                &resume.user_message,
                &[DETAILS_LABEL, CONTINUE_LABEL],
            )
            .await
        {
            Ok(prediction) => {
                prediction.confidence < MIN_CONFIDENCE
                    || prediction.label == CONTINUE_LABEL.label
            }
            Err(_) => false,
        };
        Ok(StepOutcome::Continue(input))
    }
}

/// One round of tariff details for users who asked.
struct QuoteFollowUpStep;

#[async_trait]
impl WorkflowStep for QuoteFollowUpStep {
    fn id(&self) -> StepId {
        StepId::QuoteFollowUp
    }

    async fn execute(
        &self,
        input: StepData,
        phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        if phase.resume().is_some() {
            return Ok(StepOutcome::Continue(input));
        }

        let gross = input.quote.as_ref().map(|q| q.gross).unwrap_or(0.0);
        Ok(StepOutcome::Suspend(SuspendPayload::user_input(
            input.data_collection.clone(),
            vec![Message::text(format!(
                "The M package covers personal liability up to 50M EUR for \
                 {gross:.2} EUR per month, including key loss and damage to \
                 rented property. Shall we continue?"
            ))],
        )))
    }
}

/// Rejects applicants whose claim history fails underwriting.
struct CheckClaimCountStep {
    max_claim_count: u32,
}

#[async_trait]
impl WorkflowStep for CheckClaimCountStep {
    fn id(&self) -> StepId {
        StepId::CheckClaimCount
    }

    async fn execute(
        &self,
        input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        if let Some(count) = input.data_collection.claim_count {
            if count > self.max_claim_count {
                info!(count, "underwriting rejection");
                return Ok(StepOutcome::Abort(SuspendPayload::abort(
                    input.data_collection.clone(),
                    vec![Message::text(
                        "Unfortunately we cannot offer you a policy with this \
                         claims history.",
                    )],
                )));
            }
        }
        Ok(StepOutcome::Continue(input))
    }
}

/// Shows everything collected for a final check and takes corrections.
///
/// Corrections go through the same hybrid pipeline as collection, with
/// no required keys: the turn is complete exactly when it changed
/// nothing.
struct ReviewDataStep {
    collector: Arc<HybridCollector>,
}

const REVIEW_QUESTION: &str =
    "Please check your data. Reply with corrections, or confirm to continue.";

#[async_trait]
impl WorkflowStep for ReviewDataStep {
    fn id(&self) -> StepId {
        StepId::ReviewData
    }

    async fn execute(
        &self,
        mut input: StepData,
        phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        if input.data_collection.start_date.is_none() {
            let tomorrow = Timestamp::now().add_days(1);
            input.data_collection.start_date =
                Some(tomorrow.date().format("%Y-%m-%d").to_string());
        }

        let Some(resume) = phase.resume() else {
            return Ok(StepOutcome::Suspend(SuspendPayload::user_input(
                input.data_collection.clone(),
                vec![Message::data(
                    json!({
                        "prompt": REVIEW_QUESTION,
                        "dataCollection": input.data_collection,
                        "quote": input.quote,
                    }),
                    None,
                )],
            )));
        };

        let known = merge(Some(&input.data_collection), resume.data_collection.as_ref());
        let outcome = self
            .collector
            .collect(&[], Some(REVIEW_QUESTION), &resume.user_message, &known)
            .await;

        match outcome {
            CollectionOutcome::Complete { data } => {
                let changed = data != known;
                info!(changed, "review turn processed");
                input.data_collection = data;
                input.completed = !changed;
                Ok(StepOutcome::Continue(input))
            }
            CollectionOutcome::Incomplete { error, .. } => {
                // A correction that fails validation keeps the previous
                // data; the turn only reports the conflict.
                Ok(StepOutcome::Suspend(SuspendPayload::user_input(
                    known,
                    vec![Message::error(
                        error.to_json().to_string(),
                        Some(json!({"step": "review-data"})),
                    )],
                )))
            }
        }
    }
}

/// Creates the policy draft at the platform.
struct CreatePolicyDraftStep {
    api: Arc<dyn InsuranceApi>,
}

#[async_trait]
impl WorkflowStep for CreatePolicyDraftStep {
    fn id(&self) -> StepId {
        StepId::CreatePolicyDraft
    }

    fn max_attempts(&self) -> u32 {
        3
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let collection = &input.data_collection;
        let quote = input
            .quote
            .as_ref()
            .ok_or(StepError::MissingData("quote"))?;

        let field = |value: &Option<String>, name: &'static str| {
            value.clone().ok_or(StepError::MissingData(name))
        };

        let order = PolicyDraftOrder {
            quote_id: quote.quote_id.clone(),
            customer: Customer {
                first_name: field(&collection.first_name, "first name")?,
                last_name: field(&collection.last_name, "last name")?,
                email: field(&collection.email, "email")?,
                values: CustomerValues {
                    date_of_birth: field(&collection.date_of_birth, "date of birth")?,
                    address_street: field(&collection.street, "street")?,
                    address_house_number: field(&collection.house_number, "house number")?,
                    address_plz: field(&collection.zip_code, "zip code")?,
                    address_city: field(&collection.city, "city")?,
                },
            },
            policy_start_date: field(&collection.start_date, "start date")?,
            coverage_scope: collection
                .coverage_scope
                .ok_or(StepError::MissingData("coverage scope"))?,
            payment_schedule: PAYMENT_SCHEDULE.to_string(),
        };

        let draft = self.api.create_policy_draft(&order).await?;
        info!(policy_id = %draft.policy_id, "policy draft created");

        input.policy_draft = Some(draft);
        Ok(StepOutcome::Continue(input))
    }
}

/// Pays the draft via SEPA.
struct PayPolicyStep {
    api: Arc<dyn InsuranceApi>,
}

#[async_trait]
impl WorkflowStep for PayPolicyStep {
    fn id(&self) -> StepId {
        StepId::PayPolicy
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let collection = &input.data_collection;
        let draft = input
            .policy_draft
            .as_ref()
            .ok_or(StepError::MissingData("policy draft"))?;

        let order = PaymentOrder {
            invoice_id: draft.draft_invoice.invoice_id.clone(),
            payment_order_id: draft.draft_invoice.payment_order_id.clone(),
            first_name: collection
                .first_name
                .clone()
                .ok_or(StepError::MissingData("first name"))?,
            last_name: collection
                .last_name
                .clone()
                .ok_or(StepError::MissingData("last name"))?,
            iban: collection
                .iban
                .clone()
                .ok_or(StepError::MissingData("iban"))?,
        };

        let receipt = self.api.pay_policy(&draft.policy_id, &order).await?;
        info!(policy_id = %receipt.policy_id, "policy paid");

        input.payment_result = Some(receipt);
        Ok(StepOutcome::Continue(input))
    }
}

/// Final greeting, addressed to the new customer.
struct SuccessStep;

#[async_trait]
impl WorkflowStep for SuccessStep {
    fn id(&self) -> StepId {
        StepId::Success
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let first = input.data_collection.first_name.clone().unwrap_or_default();
        let last = input.data_collection.last_name.clone().unwrap_or_default();
        input.messages = vec![Message::text(format!(
            "Congratulations {first} {last}, your liability policy is active! \
             You'll receive your documents by email."
        ))];
        input.completed = true;
        Ok(StepOutcome::Continue(input))
    }
}

fn collect(
    id: StepId,
    keys: impl Into<Vec<FieldKey>>,
    question: &str,
    toolkit: &WorkflowToolkit,
) -> Arc<CollectStep> {
    Arc::new(CollectStep::new(
        id,
        keys,
        question,
        toolkit.collector.clone(),
    ))
}

fn done(data: &StepData) -> bool {
    data.completed
}

/// Phase 1: risk data and quote.
fn data_collection_flow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            collect(
                StepId::DateOfBirth,
                [FieldKey::DateOfBirth],
                "What is your date of birth?",
                toolkit,
            ),
            done,
        )
        .do_until(
            collect(
                StepId::CoverageScope,
                [FieldKey::CoverageScope],
                "Who should be covered: just you, you and your partner, your \
                 children, or the whole family?",
                toolkit,
            ),
            done,
        )
        .then(Arc::new(FetchQuoteStep {
            api: toolkit.api.clone(),
        }))
        .build()
}

/// Phase 2: quote presentation with an optional detail round.
fn quote_presentation_flow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .then(Arc::new(QuotePresentationStep {
            intent: toolkit.intent.clone(),
        }))
        .branch(vec![(
            predicate(|data| !data.completed),
            StepNode::step(Arc::new(QuoteFollowUpStep)),
        )])
        .build()
}

/// Phase 3: underwriting questions with conditional claim drill-down.
fn underwriting_flow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    let claim_count_flow = WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            collect(
                StepId::ClaimsCount,
                [FieldKey::ClaimCount],
                "How many claims did you have in the last 5 years?",
                toolkit,
            ),
            done,
        )
        .then(Arc::new(CheckClaimCountStep {
            max_claim_count: toolkit.max_claim_count,
        }))
        .build();

    let claims_history_flow = WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            collect(
                StepId::ClaimsHistory,
                [FieldKey::HasClaims],
                "Did you have any liability claims in the past?",
                toolkit,
            ),
            done,
        )
        .branch(vec![(
            predicate(|data| data.data_collection.has_claims == Some(true)),
            StepNode::sub(claim_count_flow),
        )])
        .build();

    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            collect(
                StepId::CurrentInsurance,
                [FieldKey::HasInsurance],
                "Do you currently have private liability insurance?",
                toolkit,
            ),
            done,
        )
        .branch(vec![(
            predicate(|data| data.data_collection.has_insurance == Some(true)),
            StepNode::sub(claims_history_flow),
        )])
        .build()
}

/// Phase 4: personal data.
fn personal_data_flow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            collect(
                StepId::FullName,
                [FieldKey::FirstName, FieldKey::LastName],
                "What is your full name?",
                toolkit,
            ),
            done,
        )
        .do_until(
            collect(
                StepId::EmailAddress,
                [FieldKey::Email],
                "What is your email address?",
                toolkit,
            ),
            done,
        )
        .do_until(
            collect(
                StepId::Address,
                [
                    FieldKey::Street,
                    FieldKey::HouseNumber,
                    FieldKey::ZipCode,
                    FieldKey::City,
                ],
                "What is your address (street, house number, zip code, city)?",
                toolkit,
            ),
            done,
        )
        .build()
}

/// Phase 5: review, draft creation, legal documents.
fn review_legal_flow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            Arc::new(ReviewDataStep {
                collector: toolkit.collector.clone(),
            }),
            done,
        )
        .then(Arc::new(CreatePolicyDraftStep {
            api: toolkit.api.clone(),
        }))
        .do_until(
            Arc::new(ConfirmStep::new(
                StepId::DownloadDocuments,
                "Your contract documents are ready for download. Continue?",
                "Alright, I've stopped the application.",
                toolkit.intent.clone(),
            )),
            done,
        )
        .do_until(
            Arc::new(ConfirmStep::new(
                StepId::AcceptDocuments,
                "Do you accept the terms and the advice documentation?",
                "Alright, I've stopped the application.",
                toolkit.intent.clone(),
            )),
            done,
        )
        .build()
}

/// Phase 6: payment.
fn payment_flow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .do_until(
            collect(
                StepId::Iban,
                [FieldKey::Iban],
                "Which IBAN should we use for the monthly payment?",
                toolkit,
            ),
            done,
        )
        .then(Arc::new(ConfirmStep::new(
            StepId::PaymentConfirmation,
            "Shall I charge this account and activate the policy?",
            "Alright, I've stopped the application.",
            toolkit.intent.clone(),
        )))
        .then(Arc::new(PayPolicyStep {
            api: toolkit.api.clone(),
        }))
        .build()
}

/// Assembles the full sales workflow.
pub fn sales_workflow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::SalesWorkflow)
        .sub_workflow(data_collection_flow(toolkit))
        .sub_workflow(quote_presentation_flow(toolkit))
        .sub_workflow(underwriting_flow(toolkit))
        .sub_workflow(personal_data_flow(toolkit))
        .sub_workflow(review_legal_flow(toolkit))
        .sub_workflow(payment_flow(toolkit))
        .then(Arc::new(SuccessStep))
        .build()
}
