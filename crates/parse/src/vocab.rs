//! Small fixed vocabularies shared by the classifier and the cleaner.

use crate::util::words;

/// Grocery and menu words. Only consulted as a tie-break when a soft
/// blacklist rule fires, never as a reason to accept a line on its own.
pub const FOOD_TERMS: &[&str] = &[
    // produce
    "apple", "avocado", "banana", "bean", "berry", "broccoli", "cabbage", "carrot",
    "celery", "cherry", "corn", "cucumber", "garlic", "grape", "kiwi", "lemon",
    "lettuce", "lime", "mango", "melon", "mushroom", "onion", "orange", "pea",
    "peach", "pear", "pepper", "pineapple", "plum", "potato", "spinach", "squash",
    "strawberry", "tomato", "zucchini",
    // protein
    "bacon", "beef", "chicken", "egg", "fish", "ham", "lamb", "pork", "salmon",
    "sausage", "shrimp", "steak", "tofu", "tuna", "turkey",
    // dairy
    "butter", "cheese", "cream", "milk", "yogurt",
    // bakery and grains
    "bagel", "bread", "bun", "cereal", "cookie", "croissant", "flour", "muffin",
    "noodle", "oat", "pasta", "rice", "roll", "tortilla",
    // prepared food
    "burger", "burrito", "fries", "hash", "nugget", "pizza", "salad", "sandwich",
    "soup", "sub", "taco", "wrap", "wing",
    // drinks
    "beer", "coffee", "coke", "juice", "latte", "soda", "tea", "water", "wine",
    // pantry
    "chips", "chocolate", "honey", "jam", "nut", "oil", "salt", "sauce", "seed",
    "snack", "spice", "sugar", "vinegar",
];

/// Words that only ever describe a measurement.
pub const UNIT_WORDS: &[&str] = &[
    "kg", "kgs", "g", "gr", "lb", "lbs", "oz", "l", "ml", "ltr", "net", "wt", "weight", "each",
    "ea",
];

/// Spelled-out counts accepted in promotional phrasing.
pub const NUMBER_WORDS: &[&str] = &["one", "two", "three", "four"];

/// True when `word` is a food term or its plural.
pub fn is_food_word(word: &str) -> bool {
    let word = word.to_lowercase();
    let singular = [
        word.as_str(),
        word.strip_suffix("es").unwrap_or(&word),
        word.strip_suffix('s').unwrap_or(&word),
    ];
    singular.iter().any(|w| FOOD_TERMS.contains(w))
}

pub fn contains_food(text: &str) -> bool {
    words(text).iter().any(|w| is_food_word(w))
}

pub fn is_unit_word(word: &str) -> bool {
    UNIT_WORDS.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plurals_count_as_food() {
        assert!(is_food_word("Burritos"));
        assert!(is_food_word("PEAS"));
        assert!(is_food_word("tomatoes"));
        assert!(!is_food_word("total"));
    }

    #[test]
    fn food_inside_a_line() {
        assert!(contains_food("CHICKEN SPECIAL 5.99"));
        assert!(!contains_food("HOUSE SPECIAL 8.99"));
    }

    #[test]
    fn unit_words() {
        assert!(is_unit_word("OZ"));
        assert!(!is_unit_word("burrito"));
    }
}
