use super::contains_keyword;
use std::collections::BTreeSet;

/// A tag applied when any of its keywords occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

impl TagRule {
    pub fn new(tag: &str, keywords: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| contains_keyword(text, k))
    }
}

/// Keyword sets used to tag recipes. All keywords are lower-case.
#[derive(Debug, Clone)]
pub struct TagKeywords {
    /// Meal slots (lunch, dinner, brunch); these also become meal types
    pub meal_slots: Vec<TagRule>,
    /// Dish, course, cooking-method and diet tags
    pub dish_tags: Vec<TagRule>,
    /// Any of these rules out the vegetarian tag
    pub meat: Vec<String>,
}

impl Default for TagKeywords {
    fn default() -> Self {
        Self {
            meal_slots: vec![
                TagRule::new("lunch", &["lunch", "snack", "nibbles", "bites"]),
                TagRule::new("dinner", &["dinner"]),
                TagRule::new("brunch", &["brunch"]),
            ],
            dish_tags: vec![
                TagRule::new(
                    "breakfast",
                    &[
                        "breakfast",
                        "brunch",
                        "pancake",
                        "oat",
                        "granola",
                        "smoothie bowl",
                        "overnight oats",
                        "toast",
                        "waffle",
                        "frittata",
                        "egg muffin",
                        "omelette",
                        "bagel",
                    ],
                ),
                TagRule::new(
                    "dessert",
                    &[
                        "cake",
                        "brownie",
                        "dessert",
                        "cookie",
                        "tart",
                        "pie",
                        "ice cream",
                        "pudding",
                        "cheesecake",
                        "cupcake",
                        "mousse",
                        "custard",
                        "sorbet",
                        "lava cake",
                        "sweet roll",
                        "pastry",
                        "crepe",
                        "donut",
                        "banana bread",
                    ],
                ),
                TagRule::new(
                    "drink",
                    &[
                        "sangria",
                        "cocktail",
                        "mocktail",
                        "smoothie",
                        "latte",
                        "tea",
                        "lemonade",
                        "juice",
                        "spritz",
                        "punch",
                        "margarita",
                        "mojito",
                        "paloma",
                    ],
                ),
                TagRule::new("soup", &["soup", "ramen", "pho", "bisque"]),
                TagRule::new("salad", &["salad"]),
                TagRule::new(
                    "pasta",
                    &[
                        "pasta",
                        "spaghetti",
                        "lasagna",
                        "tagliatelle",
                        "penne",
                        "pappardelle",
                        "mac",
                    ],
                ),
                TagRule::new(
                    "noodles",
                    &["noodle", "udon", "lo mein", "pad thai", "yakisoba"],
                ),
                TagRule::new("stew", &["stew", "braise"]),
                TagRule::new("curry", &["curry"]),
                TagRule::new("stir-fry", &["stir fry", "stir-fry"]),
                TagRule::new("bowl", &["bowl"]),
                TagRule::new("sandwich", &["sandwich", "wrap", "burger"]),
                TagRule::new("rice", &["rice", "risotto", "paella", "pilaf"]),
                TagRule::new("pizza", &["pizza", "flatbread"]),
                TagRule::new("tacos", &["taco"]),
                TagRule::new("appetizer", &["appetizer", "starter", "bites"]),
                TagRule::new("roast", &["roast", "sheet pan", "tray bake", "roasted"]),
                TagRule::new("grill", &["grill", "grilled", "bbq", "barbecue"]),
                TagRule::new("vegan", &["vegan"]),
            ],
            meat: [
                "beef",
                "chicken",
                "turkey",
                "pork",
                "lamb",
                "mutton",
                "bacon",
                "ham",
                "sausage",
                "duck",
                "veal",
                "prosciutto",
                "salami",
                "anchovy",
                "anchovies",
                "tuna",
                "salmon",
                "cod",
                "trout",
                "shrimp",
                "prawn",
                "prawns",
                "lobster",
                "crab",
                "clam",
                "clams",
                "mussel",
                "mussels",
                "octopus",
                "squid",
                "calamari",
                "fish",
                "seafood",
                "oxtail",
                "short rib",
                "short ribs",
                "steak",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

/// Tags and meal types for one recipe, both sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub tags: Vec<String>,
    pub meal_types: Vec<String>,
}

/// Keyword-based recipe tagger.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    keywords: TagKeywords,
}

impl Classifier {
    pub fn new(keywords: TagKeywords) -> Self {
        Self { keywords }
    }

    pub fn classify(&self, title: &str, ingredients: &[String]) -> Classification {
        let tags = self.infer_tags(title, ingredients);
        let meal_types = self.infer_meal_types(title, ingredients, &tags);
        Classification { tags, meal_types }
    }

    /// Infer tags from the title and ingredients.
    ///
    /// A recipe is tagged vegetarian unless a meat or seafood keyword shows up.
    pub fn infer_tags(&self, title: &str, ingredients: &[String]) -> Vec<String> {
        let text = blob(title, ingredients);
        let mut tags: BTreeSet<String> = self
            .keywords
            .meal_slots
            .iter()
            .chain(&self.keywords.dish_tags)
            .filter(|rule| rule.matches(&text))
            .map(|rule| rule.tag.clone())
            .collect();

        if !self.keywords.meat.iter().any(|k| contains_keyword(&text, k)) {
            tags.insert("vegetarian".to_string());
        }

        tags.into_iter().collect()
    }

    /// Infer meal types from explicit keywords and the already inferred tags.
    ///
    /// Without any explicit hint, salads are lunch, soups are dinner,
    /// desserts are dessert and everything else is dinner.
    pub fn infer_meal_types(&self, title: &str, ingredients: &[String], tags: &[String]) -> Vec<String> {
        let text = blob(title, ingredients);
        let tagged = |tag: &str| tags.iter().any(|t| t.eq_ignore_ascii_case(tag));
        let mut meal_types = BTreeSet::new();

        for meal in ["breakfast", "brunch", "dessert"] {
            if tagged(meal) || contains_keyword(&text, meal) {
                meal_types.insert(meal.to_string());
            }
        }
        for rule in &self.keywords.meal_slots {
            if rule.matches(&text) {
                meal_types.insert(rule.tag.clone());
            }
        }

        if meal_types.is_empty() {
            let fallback = if tagged("salad") || contains_keyword(&text, "salad") {
                "lunch"
            } else if tagged("soup") || contains_keyword(&text, "soup") {
                "dinner"
            } else if tagged("dessert") {
                "dessert"
            } else {
                "dinner"
            };
            meal_types.insert(fallback.to_string());
        }

        meal_types.into_iter().collect()
    }
}

fn blob(title: &str, ingredients: &[String]) -> String {
    format!("{} {}", title, ingredients.join(" ")).to_lowercase()
}
