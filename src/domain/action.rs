use super::money::Money;
use super::topup::PaymentMethod;
use std::fmt;
use std::str::FromStr;

/// Every inline-button action the bot emits, decoded once from callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    ConfirmOrder(String),
    CancelOrder(String),
    ApproveTopup(String),
    RejectTopup(String),
    SelectPayment(PaymentMethod, Money),
    CancelTopup,
    RequestRegister,
    ApproveRegister(String),
    RejectRegister(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown callback data `{0}`")]
pub struct UnknownAction(pub String);

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::ConfirmOrder(id) => write!(f, "order_confirm_{id}"),
            CallbackAction::CancelOrder(id) => write!(f, "order_cancel_{id}"),
            CallbackAction::ApproveTopup(id) => write!(f, "topup_approve_{id}"),
            CallbackAction::RejectTopup(id) => write!(f, "topup_reject_{id}"),
            CallbackAction::SelectPayment(method, amount) => {
                write!(f, "topup_pay_{}_{}", method.code(), amount.units())
            }
            CallbackAction::CancelTopup => f.write_str("topup_cancel"),
            CallbackAction::RequestRegister => f.write_str("request_register"),
            CallbackAction::ApproveRegister(uid) => write!(f, "register_approve_{uid}"),
            CallbackAction::RejectRegister(uid) => write!(f, "register_reject_{uid}"),
        }
    }
}

fn id_after<'a>(data: &'a str, prefix: &str) -> Option<&'a str> {
    data.strip_prefix(prefix).filter(|id| !id.is_empty())
}

impl FromStr for CallbackAction {
    type Err = UnknownAction;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownAction(data.to_string());

        match data {
            "topup_cancel" => return Ok(CallbackAction::CancelTopup),
            "request_register" => return Ok(CallbackAction::RequestRegister),
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("topup_pay_") {
            let (method, amount) = rest.split_once('_').ok_or_else(unknown)?;
            let method = method.parse().map_err(|_| unknown())?;
            let amount = amount.parse::<i64>().map_err(|_| unknown())?;
            return Ok(CallbackAction::SelectPayment(method, Money::new(amount)));
        }

        let decoders: [(&str, fn(String) -> CallbackAction); 6] = [
            ("order_confirm_", CallbackAction::ConfirmOrder),
            ("order_cancel_", CallbackAction::CancelOrder),
            ("topup_approve_", CallbackAction::ApproveTopup),
            ("topup_reject_", CallbackAction::RejectTopup),
            ("register_approve_", CallbackAction::ApproveRegister),
            ("register_reject_", CallbackAction::RejectRegister),
        ];
        decoders
            .iter()
            .find_map(|(prefix, build)| id_after(data, prefix).map(|id| build(id.to_string())))
            .ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_actions() {
        assert_eq!(
            "order_confirm_ORD1".parse(),
            Ok(CallbackAction::ConfirmOrder("ORD1".into()))
        );
        assert_eq!(
            "topup_pay_wave_5000".parse(),
            Ok(CallbackAction::SelectPayment(
                PaymentMethod::Wave,
                Money::new(5000)
            ))
        );
        assert_eq!("topup_cancel".parse(), Ok(CallbackAction::CancelTopup));
        assert_eq!(
            "register_reject_77".parse(),
            Ok(CallbackAction::RejectRegister("77".into()))
        );
    }

    #[test]
    fn test_reject_malformed_data() {
        for data in [
            "order_confirm_",
            "topup_pay_paypal_5000",
            "topup_pay_kpay_lots",
            "topup_pay_kpay",
            "something_else",
        ] {
            assert!(data.parse::<CallbackAction>().is_err(), "{data}");
        }
    }

    #[test]
    fn test_encoding_matches_decoding() {
        let action = CallbackAction::SelectPayment(PaymentMethod::Kpay, Money::new(12000));
        assert_eq!(action.to_string(), "topup_pay_kpay_12000");
        assert_eq!(action.to_string().parse(), Ok(action));
    }
}
