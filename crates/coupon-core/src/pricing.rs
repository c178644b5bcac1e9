//! # Cart Pricing
//!
//! Folds an [`EvaluationResult`] into the priced cart callers see.
//!
//! ```text
//! Cart                        EvaluationResult              PricedCart
//! ────────────────────        ─────────────────────         ─────────────────────────
//! A × 4                       A  $100.00  bonus 0            A × 4  $100.00   $0.00
//! B × 1              ──►      B   $25.00  bonus 2   ──►      B × 3   $25.00  $50.00
//!                             subtotal $425.00               total   $425.00
//!                             discount  $50.00               final   $375.00
//! ```
//! Quantities include bonus units; totals come straight from the evaluation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::engine::EvaluationResult;
use crate::money::Money;

/// One line of a priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: String,
    /// Cart quantity plus bonus units.
    pub quantity: i64,
    #[serde(rename = "price")]
    pub unit_price: Money,
    #[serde(rename = "total_discount")]
    pub discount: Money,
}

/// A cart after a coupon has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedCart {
    pub items: Vec<PricedLine>,
    pub total_price: Money,
    pub total_discount: Money,
    pub final_price: Money,
    pub message: String,
}

impl PricedCart {
    /// Builds the priced cart for `cart` under `evaluation`.
    ///
    /// Every line comes from the evaluation, which covers each cart line
    /// plus any bonus-only lines. Cart lines keep their order; bonus-only
    /// lines follow in evaluation order.
    pub fn assemble(cart: &Cart, evaluation: &EvaluationResult) -> Self {
        let (in_cart, bonus_only): (Vec<_>, Vec<_>) = evaluation
            .lines
            .iter()
            .partition(|eval| cart.contains(&eval.product_id));

        let items = in_cart
            .into_iter()
            .chain(bonus_only)
            .map(|eval| PricedLine {
                product_id: eval.product_id.clone(),
                quantity: eval.quantity + eval.bonus_quantity,
                unit_price: eval.unit_price,
                discount: eval.discount,
            })
            .collect();

        PricedCart {
            items,
            total_price: evaluation.subtotal,
            total_discount: evaluation.total_discount,
            final_price: evaluation.final_price(),
            message: evaluation.message.clone(),
        }
    }

    /// The priced line of a product, if any.
    pub fn item_for(&self, product_id: &str) -> Option<&PricedLine> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::engine::LineEvaluation;
    use crate::types::CouponKind;

    fn eval_line(id: &str, price: i64, qty: i64, bonus: i64, discount: i64) -> LineEvaluation {
        LineEvaluation {
            product_id: id.to_string(),
            unit_price: Money::from_cents(price),
            quantity: qty,
            bonus_quantity: bonus,
            discount: Money::from_cents(discount),
        }
    }

    fn evaluation(lines: Vec<LineEvaluation>, subtotal: i64, discount: i64) -> EvaluationResult {
        EvaluationResult {
            coupon_id: "c-1".to_string(),
            code: "COUPON-X".to_string(),
            kind: CouponKind::BuyXGetY,
            lines,
            subtotal: Money::from_cents(subtotal),
            total_discount: Money::from_cents(discount),
            message: "Buy X Get Y discount applied!".to_string(),
        }
    }

    #[test]
    fn test_assemble_adds_bonus_to_quantity() {
        let cart = Cart::from_lines([
            CartLine::priced("A", 4, Money::from_cents(10000)),
            CartLine::priced("B", 1, Money::from_cents(2500)),
        ])
        .unwrap();
        let eval = evaluation(
            vec![
                eval_line("A", 10000, 4, 0, 0),
                eval_line("B", 2500, 1, 2, 5000),
            ],
            42500,
            5000,
        );

        let priced = PricedCart::assemble(&cart, &eval);

        assert_eq!(priced.items.len(), 2);
        assert_eq!(priced.item_for("A").unwrap().quantity, 4);
        let b = priced.item_for("B").unwrap();
        assert_eq!(b.quantity, 3);
        assert_eq!(b.discount.cents(), 5000);
        assert_eq!(priced.total_price.cents(), 42500);
        assert_eq!(priced.final_price.cents(), 37500);
        assert_eq!(priced.message, "Buy X Get Y discount applied!");
    }

    #[test]
    fn test_bonus_only_lines_follow_cart_lines() {
        let cart = Cart::from_lines([CartLine::priced("A", 2, Money::from_cents(10000))]).unwrap();
        let eval = evaluation(
            vec![
                eval_line("A", 10000, 2, 0, 0),
                eval_line("B", 2500, 0, 1, 2500),
            ],
            20000,
            2500,
        );

        let priced = PricedCart::assemble(&cart, &eval);

        let ids: Vec<_> = priced.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(priced.items[1].quantity, 1);
        assert_eq!(priced.items[1].unit_price.cents(), 2500);
    }

    #[test]
    fn test_bonus_only_line_listed_first_still_follows_cart_lines() {
        let cart = Cart::from_lines([CartLine::new("A", 2)]).unwrap();
        let eval = evaluation(
            vec![
                eval_line("B", 2500, 0, 1, 2500),
                eval_line("A", 10000, 2, 0, 0),
            ],
            20000,
            2500,
        );

        let priced = PricedCart::assemble(&cart, &eval);

        let ids: Vec<_> = priced.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(priced.items[0].unit_price.cents(), 10000);
    }

    #[test]
    fn test_wire_shape() {
        let cart = Cart::from_lines([CartLine::priced("A", 1, Money::from_cents(100))]).unwrap();
        let eval = evaluation(vec![eval_line("A", 100, 1, 0, 10)], 100, 10);

        let json = serde_json::to_value(PricedCart::assemble(&cart, &eval)).unwrap();
        assert_eq!(json["items"][0]["price"], 100);
        assert_eq!(json["items"][0]["total_discount"], 10);
        assert_eq!(json["final_price"], 90);
    }
}
