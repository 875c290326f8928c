//! # Voice Commands
//!
//! Turns one utterance into a committed record and a reply to read back.
//!
//! ## Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "vendí 3 pulseras"                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  IntentParser::parse ──► ParsedIntent                                   │
//! │                                                                         │
//! │  Sale              ──► commit_single(Sale)      "Venta de 3 Pulsera..." │
//! │  Expense           ──► commit_single(Expense)   "Gasto de $2.000 ..."   │
//! │  InventoryRestock  ──► commit_single(Restock)   "Repuestos 50 ..."      │
//! │  MultiSale         ──► commit_multi_item        "Venta de 2 productos"  │
//! │  InventoryAdd      ──► create_product           "Producto \"pan\" ..."  │
//! │  Unknown           ──► (nothing written)        "No entendí: ..."       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected command is not an error of this call: its Spanish message
//! comes back in a reply with `success: false`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::product::create_product;
use super::transaction::{commit_multi_item, commit_single};
use crate::error::ApiResult;
use crate::state::{ConfigState, DbState};
use emprende_core::intent::{GENERAL_EXPENSE_LABEL, GENERAL_SALE_LABEL};
use emprende_core::{Money, NewProduct, ParsedIntent, SingleCommand};

/// What the merchant sees (or hears) after speaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceReply {
    pub success: bool,
    pub message: String,
    /// How the utterance was understood.
    pub intent: ParsedIntent,
}

/// Parses and executes one utterance.
pub async fn run_utterance(db: &DbState, config: &ConfigState, text: &str) -> VoiceReply {
    let intent = config.parser().parse(text);
    debug!(?intent, "run_utterance command");

    match dispatch(db, config, &intent).await {
        Ok((success, message)) => VoiceReply {
            success,
            message,
            intent,
        },
        Err(err) => {
            warn!(code = ?err.code, message = %err.message, "Voice command rejected");
            VoiceReply {
                success: false,
                message: err.message,
                intent,
            }
        }
    }
}

async fn dispatch(
    db: &DbState,
    config: &ConfigState,
    intent: &ParsedIntent,
) -> ApiResult<(bool, String)> {
    match intent {
        ParsedIntent::Sale {
            amount,
            product,
            is_quantity,
        } => {
            let description = product.as_deref().unwrap_or(GENERAL_SALE_LABEL);
            let command = SingleCommand::sale(*amount, description, *is_quantity);
            let outcome = commit_single(db, config, &command).await?;
            let message = outcome.message.unwrap_or_else(|| {
                format!("¡Venta de {} registrada!", Money::from_pesos(outcome.amount))
            });
            Ok((true, message))
        }

        ParsedIntent::Expense {
            amount,
            description,
        } => {
            let description = description.as_deref().unwrap_or(GENERAL_EXPENSE_LABEL);
            let outcome = commit_single(db, config, &SingleCommand::expense(*amount, description)).await?;
            Ok((
                true,
                format!("Gasto de {} registrado.", Money::from_pesos(outcome.amount)),
            ))
        }

        ParsedIntent::InventoryRestock { amount, product } => {
            let outcome = commit_single(db, config, &SingleCommand::restock(*amount, product.as_str())).await?;
            Ok((
                true,
                outcome
                    .message
                    .unwrap_or_else(|| "Stock actualizado.".to_string()),
            ))
        }

        ParsedIntent::MultiSale { items } => {
            let outcome = commit_multi_item(db, config, items).await?;
            let message = if outcome.success && !outcome.failed_items.is_empty() {
                format!(
                    "{} No encontré: {}.",
                    outcome.message,
                    outcome.failed_items.join(", ")
                )
            } else {
                outcome.message
            };
            Ok((outcome.success, message))
        }

        ParsedIntent::InventoryAdd {
            product,
            price,
            stock,
        } => {
            let new = NewProduct::new(product.as_str(), price.unwrap_or(0), stock.unwrap_or(0));
            let created = create_product(db, config, &new).await?;
            Ok((true, created.message))
        }

        ParsedIntent::Unknown { original } => Ok((
            false,
            format!(
                "No entendí: \"{}\". Intenta: 'Venta de 5000' o 'Vendí 3 Pulseras'",
                original
            ),
        )),
    }
}
