use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of validating or applying part of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Ok,
    Success,
    InvalidAccountId,
    InvalidAccountAmounts,
    AccountRepeatedInAccountAmounts,
    AccountDeleted,
    AccountExpiredAndPendingRemoval,
    InvalidSignature,
    InsufficientAccountBalance,
    InsufficientPayerBalance,
    InvalidKeyEncoding,
    InvalidTokenId,
    TokenWasDeleted,
    TokenNotAssociatedToAccount,
    AccountFrozenForToken,
    InsufficientTokenBalance,
    AccountAmountTransfersOnlyAllowedForFungibleCommon,
    InvalidNftId,
    SenderDoesNotOwnNftSerialNo,
    NoRemainingAutomaticAssociations,
}

impl ResponseCode {
    pub fn is_ok(self) -> bool {
        self == ResponseCode::Ok
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseCode::Ok => "OK",
            ResponseCode::Success => "SUCCESS",
            ResponseCode::InvalidAccountId => "INVALID_ACCOUNT_ID",
            ResponseCode::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
            ResponseCode::AccountRepeatedInAccountAmounts => {
                "ACCOUNT_REPEATED_IN_ACCOUNT_AMOUNTS"
            }
            ResponseCode::AccountDeleted => "ACCOUNT_DELETED",
            ResponseCode::AccountExpiredAndPendingRemoval => {
                "ACCOUNT_EXPIRED_AND_PENDING_REMOVAL"
            }
            ResponseCode::InvalidSignature => "INVALID_SIGNATURE",
            ResponseCode::InsufficientAccountBalance => "INSUFFICIENT_ACCOUNT_BALANCE",
            ResponseCode::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            ResponseCode::InvalidKeyEncoding => "INVALID_KEY_ENCODING",
            ResponseCode::InvalidTokenId => "INVALID_TOKEN_ID",
            ResponseCode::TokenWasDeleted => "TOKEN_WAS_DELETED",
            ResponseCode::TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
            ResponseCode::AccountFrozenForToken => "ACCOUNT_FROZEN_FOR_TOKEN",
            ResponseCode::InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
            ResponseCode::AccountAmountTransfersOnlyAllowedForFungibleCommon => {
                "ACCOUNT_AMOUNT_TRANSFERS_ONLY_ALLOWED_FOR_FUNGIBLE_COMMON"
            }
            ResponseCode::InvalidNftId => "INVALID_NFT_ID",
            ResponseCode::SenderDoesNotOwnNftSerialNo => "SENDER_DOES_NOT_OWN_NFT_SERIAL_NO",
            ResponseCode::NoRemainingAutomaticAssociations => {
                "NO_REMAINING_AUTOMATIC_ASSOCIATIONS"
            }
        };
        f.write_str(name)
    }
}
