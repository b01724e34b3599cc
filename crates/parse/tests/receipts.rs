use std::str::FromStr;

use chrono::NaiveDate;
use larder_core::{ItemWarning, LayoutFormat, PaymentMethod, Receipt, ReceiptWarning, Unit};
use larder_parse::ReceiptParser;
use rust_decimal::Decimal;

const FLAT_INVOICE: &str = r#"Invoice No. 10                           Date: May 11, 2019

Item Name         Qty    Rate    Amount
Pizza Large        1    430.0    430.0
Pasta             2    220.0    440.0
Pizza Makhaani - Full  1    190.0    190.0
                           Total:  1,060.0"#;

const FAST_FOOD: &str = r#"485

KS# 4                           08:13:56 AM
QTY ITEM                        TOTAL
  1 Buy One, Get One             3.99
    1 Sausage Egg McMuffin
    1 Sausage Egg McMuffin
  1 2 Burritos EVM                6.99
    1 S Coffee
      ADD Cream
  1 2 Hash Browns                 0.80
  1 M Iced Coffee                  1.40
      NO Liquid Sugar

Subtotal                         13.18
GST                               0.66
Take-Out Total                   13.84
CREDIT CARD                      13.84
Change                            0.00"#;

const NUMBERED: &str = r#"LOREM SHOP
123 ANYWHERE ST

1: 0275 Ut wisi enim           2.99
2: 1227 Nibh euismod            1.30
3: 0942 Rdol magna             17.00
4: 0257 Mnonuy nibh             6.99
5: 1693 Kaoreet dolore          1.20
6: 9463 Taliquam erat           5.10
7: 0059 Aeuismod               10.00
8: 3556 Knonuy nib              4.99

Discount                       $5.99
TOTAL                          $34.50"#;

const GROCERY: &str = r#"FRESH MART
20-May-18 22:55
BANANAS
0.778kg NET @ $5.99/kg        4.66
1 9275 Bread                  2.99
2 GYRO $50.00
SUBTOTAL                    107.65"#;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn parse(text: &str) -> Receipt {
    ReceiptParser::with_defaults().parse(text)
}

fn names(receipt: &Receipt) -> Vec<&str> {
    receipt.items.iter().map(|i| i.name.as_str()).collect()
}

fn has_mismatch(receipt: &Receipt) -> bool {
    receipt.warnings.iter().any(|w| matches!(w, ReceiptWarning::TotalsMismatch { .. }))
}

#[test]
fn flat_invoice_items_add_up() {
    let receipt = parse(FLAT_INVOICE);
    assert_eq!(receipt.format, LayoutFormat::Flat);
    assert_eq!(names(&receipt), vec!["Pizza Large", "Pasta", "Pizza Makhaani - Full"]);

    let pasta = &receipt.items[1];
    assert_eq!(pasta.quantity, dec("2"));
    assert_eq!(pasta.price, Some(dec("220.0")));
    assert_eq!(pasta.line_total, Some(dec("440.0")));

    assert_eq!(receipt.total, Some(dec("1060.0")));
    assert_eq!(receipt.items_sum(), dec("1060.0"));
    assert_eq!(receipt.transaction_date, NaiveDate::from_ymd_opt(2019, 5, 11));
    assert_eq!(receipt.merchant_name, None);
    assert_eq!(receipt.payment_method, None);
    assert!((receipt.confidence - 0.8).abs() < 1e-6, "{}", receipt.confidence);
    assert!(receipt.warnings.is_empty(), "{:?}", receipt.warnings);
}

#[test]
fn fast_food_hierarchy() {
    let receipt = parse(FAST_FOOD);
    assert_eq!(receipt.format, LayoutFormat::Hierarchical);
    assert_eq!(
        names(&receipt),
        vec![
            "Sausage Egg Mcmuffin",
            "Sausage Egg Mcmuffin",
            "Burritos",
            "S Coffee",
            "Hash Browns",
            "M Iced Coffee",
        ]
    );

    // Sub-items under the promo header have no priced ancestor.
    for item in &receipt.items[..2] {
        assert_eq!(item.price, None);
        assert!(item.warnings.contains(&ItemWarning::PriceParseFailure));
    }

    let burritos = &receipt.items[2];
    assert_eq!(burritos.quantity, dec("2"));
    assert_eq!(burritos.line_total, Some(dec("6.99")));

    let coffee = &receipt.items[3];
    assert_eq!(coffee.price, Some(dec("6.99")));
    assert!(coffee.price_inherited);

    let hash_browns = &receipt.items[4];
    assert_eq!(hash_browns.quantity, dec("2"));
    assert_eq!(hash_browns.price, Some(dec("0.40")));
    assert_eq!(hash_browns.line_total, Some(dec("0.80")));

    assert_eq!(receipt.subtotal, Some(dec("13.18")));
    assert_eq!(receipt.tax, Some(dec("0.66")));
    assert_eq!(receipt.total, Some(dec("13.84")));
    assert!(receipt.warnings.contains(&ReceiptWarning::TotalsMismatch {
        expected: dec("13.18"),
        computed: dec("9.19"),
    }));
    assert_eq!(
        receipt
            .warnings
            .iter()
            .filter(|w| matches!(w, ReceiptWarning::PriceParseFailure { .. }))
            .count(),
        2
    );
}

#[test]
fn fast_food_payment_and_confidence() {
    let receipt = parse(FAST_FOOD);
    assert_eq!(receipt.payment_method, Some(PaymentMethod::Credit));
    // Items, total, subtotal and tax found; items fall short of the subtotal.
    assert!((receipt.confidence - 0.7).abs() < 1e-6, "{}", receipt.confidence);
}

#[test]
fn numbered_lines_with_item_codes() {
    let receipt = parse(NUMBERED);
    assert_eq!(
        names(&receipt),
        vec![
            "Ut Wisi Enim",
            "Nibh Euismod",
            "Rdol Magna",
            "Mnonuy Nibh",
            "Kaoreet Dolore",
            "Taliquam Erat",
            "Aeuismod",
            "Knonuy Nib",
        ]
    );
    assert!(receipt.items.iter().all(|i| i.quantity == Decimal::ONE));
    assert_eq!(receipt.items[0].item_code.as_deref(), Some("0275"));
    assert_eq!(receipt.merchant_name.as_deref(), Some("LOREM SHOP"));
    assert_eq!(receipt.total, Some(dec("34.50")));
    assert!(has_mismatch(&receipt));
}

#[test]
fn grocery_weights_codes_and_multipliers() {
    let receipt = parse(GROCERY);
    assert_eq!(names(&receipt), vec!["Bananas", "Bread", "Gyro"]);

    let bananas = &receipt.items[0];
    assert_eq!(bananas.quantity, dec("0.778"));
    assert_eq!(bananas.unit, Unit::Kg);
    assert_eq!(bananas.price, Some(dec("5.99")));
    assert_eq!(bananas.line_total, Some(dec("4.66")));
    assert_eq!(bananas.source_lines.first, 3);
    assert_eq!(bananas.source_lines.last, 4);

    assert_eq!(receipt.items[1].quantity, Decimal::ONE);
    assert_eq!(receipt.items[2].quantity, dec("2"));
    assert_eq!(receipt.items[2].price, Some(dec("50.00")));

    assert_eq!(receipt.merchant_name.as_deref(), Some("FRESH MART"));
    assert_eq!(receipt.transaction_date, NaiveDate::from_ymd_opt(2018, 5, 20));
    assert!(receipt.transaction_time.is_some());
    assert!(!has_mismatch(&receipt), "{:?}", receipt.warnings);
}

#[test]
fn promo_header_children_keep_own_prices() {
    let receipt = parse("Buy One, Get One\n    Big Mac        5.99\n    McChicken      4.49");
    assert_eq!(names(&receipt), vec!["Big Mac", "Mcchicken"]);
    assert_eq!(receipt.items[0].price, Some(dec("5.99")));
    assert_eq!(receipt.items[1].price, Some(dec("4.49")));
}

#[test]
fn standalone_priced_line() {
    let receipt = parse("Pizza    $103");
    assert_eq!(names(&receipt), vec!["Pizza"]);
    assert_eq!(receipt.items[0].price, Some(dec("103")));
}

#[test]
fn names_carry_no_promo_or_line_refs() {
    for text in [FLAT_INVOICE, FAST_FOOD, NUMBERED, GROCERY] {
        for item in parse(text).items {
            let lower = item.name.to_lowercase();
            assert!(!(lower.contains("buy") && lower.contains("get")), "{}", item.name);
            assert!(!lower.split_whitespace().any(|w| w == "line"), "{}", item.name);
        }
    }
}

#[test]
fn parsing_is_deterministic() {
    let parser = ReceiptParser::with_defaults();
    assert_eq!(parser.parse(FAST_FOOD), parser.parse(FAST_FOOD));
}

#[test]
fn receipt_serializes_to_json() {
    let json = serde_json::to_value(parse(GROCERY)).unwrap();
    assert_eq!(json["transaction_date"], "2018-05-20");
    assert_eq!(json["items"][0]["unit"], "kg");
    assert_eq!(json["items"][0]["quantity"], "0.778");
    assert_eq!(json["format"], "hierarchical");
    assert!(json.get("payment_method").is_none());
    assert!(json["confidence"].is_number());
}
