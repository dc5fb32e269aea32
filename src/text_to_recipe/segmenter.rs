use super::tokens;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[).]").expect("valid regex"));
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-•–—]\s*(.+)$").expect("valid regex"));
static STEP_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:step\s*)?(\d+)[)\.:\-]?\s*(.+)$").expect("valid regex")
});
static INLINE_INGREDIENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)ingredients[^:]*:(.+)").expect("valid regex"));

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Keyword lists driving the segmenter. All entries are lower-case.
#[derive(Debug, Clone)]
pub struct SegmenterKeywords {
    /// Lines containing one of these open the ingredient section
    pub ingredient_anchors: Vec<String>,
    /// Lines starting with one of these close the ingredient section
    pub ingredient_stopwords: Vec<String>,
    /// Sub-heading prefixes kept verbatim inside the ingredient section
    pub ingredient_subheadings: Vec<String>,
    /// Section headers skipped by the step scan
    pub instruction_keywords: Vec<String>,
    /// Lines containing one of these close the step section
    pub instruction_terminators: Vec<String>,
    /// Units that mark a line as an ingredient
    pub measurement_tokens: Vec<String>,
}

impl Default for SegmenterKeywords {
    fn default() -> Self {
        Self {
            ingredient_anchors: to_strings(&[
                "you need",
                "ingredients",
                "ingredient list",
                "what you need",
                "here's what you need",
                "you will need",
                "shopping list",
                "for the salad",
                "for the dressing",
                "for the sauce",
                "for the marinade",
            ]),
            ingredient_stopwords: to_strings(&[
                "how",
                "method",
                "instructions",
                "directions",
                "steps",
                "prep",
                "preparation",
                "makes",
                "serves",
                "macros",
                "calories",
                "enjoy",
                "note",
                "notes",
                "tip",
                "tips",
                "storage",
                "cook",
                "bake",
                "fry",
                "to make",
            ]),
            ingredient_subheadings: to_strings(&[
                "optional toppings",
                "optional:",
                "toppings",
                "garnish",
                "for the",
            ]),
            instruction_keywords: to_strings(&[
                "how",
                "instructions",
                "method",
                "directions",
                "steps",
                "to make",
                "prep",
                "preparation",
                "cook",
                "bake",
                "finish",
            ]),
            instruction_terminators: to_strings(&[
                "serves", "macros", "calories", "enjoy", "notes", "note", "tag", "share",
            ]),
            measurement_tokens: to_strings(&[
                "cup",
                "cups",
                "tsp",
                "teaspoon",
                "teaspoons",
                "tbsp",
                "tablespoon",
                "tablespoons",
                "g",
                "gram",
                "grams",
                "kg",
                "ml",
                "l",
                "oz",
                "lb",
                "lbs",
                "clove",
                "cloves",
                "slice",
                "slices",
                "sprig",
                "sprigs",
                "bunch",
                "handful",
                "packet",
                "pack",
                "package",
                "can",
                "tin",
                "fillet",
                "fillets",
                "stick",
                "sticks",
            ]),
        }
    }
}

/// Progress of a single section scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Nothing collected yet; noise lines are skipped
    SeekingAnchor,
    /// At least one item collected; the first non-matching line ends the section
    Collecting,
    Terminated,
}

/// How the ingredient scan sees one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngredientLine<'a> {
    /// Hashtag or link
    Boundary,
    /// Starts with a stopword such as "method" or "serves"
    Stopword,
    /// `1)` or `1.` list item
    Numbered,
    /// Bulleted item; holds the text after the bullet
    Bullet(&'a str),
    /// "for the sauce", "garnish", ...
    Subheading,
    /// Mentions a unit or contains a digit
    Measured,
    Plain,
}

/// How the step scan sees one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepLineKind<'a> {
    /// Hashtag or link
    Boundary,
    /// Section header such as "Method:"
    Heading,
    /// Numbered step; holds the text after the marker
    Numbered(&'a str),
    /// Bulleted item; holds the text after the bullet
    Bullet(&'a str),
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine<'a> {
    pub kind: StepLineKind<'a>,
    /// Mentions "serves", "notes", ... and ends the section once steps exist
    pub terminates: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Skip,
    Push(String),
    Append(String),
    Stop,
}

/// Result of the ingredient scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientScan {
    pub items: Vec<String>,
    /// Index of the first line the step scan should look at
    pub stop: usize,
}

/// Ingredients and steps recovered from a description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Splits free-form recipe captions into an ingredient list and a step list.
///
/// Both scans are single forward passes: the first line that no longer looks
/// like part of the current section ends it.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    keywords: SegmenterKeywords,
    max_continuation_chars: Option<usize>,
}

impl Segmenter {
    pub fn new(keywords: SegmenterKeywords) -> Self {
        Self {
            keywords,
            max_continuation_chars: None,
        }
    }

    /// Stop merging unmarked lines into a step once it would exceed `max` characters.
    pub fn with_max_continuation(mut self, max: Option<usize>) -> Self {
        self.max_continuation_chars = max;
        self
    }

    pub fn segment(&self, description: &str) -> Segmented {
        let lines = prepare_lines(description);
        let scan = self.ingredients(&lines);
        let steps = self.steps(&lines, scan.stop);

        debug!(
            "Segmented {} lines into {} ingredients and {} steps",
            lines.len(),
            scan.items.len(),
            steps.len()
        );
        Segmented {
            ingredients: scan.items,
            steps,
        }
    }

    pub fn classify_ingredient_line<'a>(&self, line: &'a str) -> IngredientLine<'a> {
        let lower = line.to_lowercase();
        let kw = &self.keywords;

        if is_boundary(&lower) {
            IngredientLine::Boundary
        } else if kw
            .ingredient_stopwords
            .iter()
            .any(|stop| lower.starts_with(stop.as_str()))
        {
            IngredientLine::Stopword
        } else if NUMBERED_ITEM.is_match(line) {
            IngredientLine::Numbered
        } else if let Some(rest) = bullet_text(line) {
            IngredientLine::Bullet(rest)
        } else if kw
            .ingredient_subheadings
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
        {
            IngredientLine::Subheading
        } else if self.has_measurement(&lower) || line.chars().any(|c| c.is_ascii_digit()) {
            IngredientLine::Measured
        } else {
            IngredientLine::Plain
        }
    }

    pub fn classify_step_line<'a>(&self, line: &'a str) -> StepLine<'a> {
        let lower = line.to_lowercase();
        let kw = &self.keywords;
        let terminates = kw
            .instruction_terminators
            .iter()
            .any(|term| lower.contains(term.as_str()));

        let kind = if is_boundary(&lower) {
            StepLineKind::Boundary
        } else if kw
            .instruction_keywords
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
            && !NUMBERED_ITEM.is_match(line)
        {
            StepLineKind::Heading
        } else if let Some(rest) = step_text(line) {
            StepLineKind::Numbered(rest)
        } else if let Some(rest) = bullet_text(line) {
            StepLineKind::Bullet(rest)
        } else {
            StepLineKind::Plain
        };

        StepLine { kind, terminates }
    }

    /// Collect the ingredient section.
    ///
    /// Scanning starts after the first line mentioning an anchor keyword, or
    /// at the top when there is none. When nothing is found, an inline
    /// `Ingredients: a, b, c` list is used instead.
    pub fn ingredients(&self, lines: &[String]) -> IngredientScan {
        let start = lines
            .iter()
            .position(|line| {
                let lower = line.to_lowercase();
                self.keywords
                    .ingredient_anchors
                    .iter()
                    .any(|anchor| lower.contains(anchor.as_str()))
            })
            .map_or(0, |idx| idx + 1);

        let mut items = Vec::new();
        let mut state = ScanState::SeekingAnchor;
        let mut i = start;

        while i < lines.len() {
            let line = lines[i].as_str();
            match ingredient_action(state, line, self.classify_ingredient_line(line)) {
                Action::Push(item) => {
                    items.push(item);
                    state = ScanState::Collecting;
                }
                Action::Stop => {
                    state = ScanState::Terminated;
                    break;
                }
                Action::Skip | Action::Append(_) => {}
            }
            i += 1;
        }
        debug!("Ingredient scan ended in {:?} at line {}", state, i);

        if !items.is_empty() {
            return IngredientScan { items, stop: i };
        }

        IngredientScan {
            items: inline_ingredients(lines),
            stop: start,
        }
    }

    /// Collect the step section starting at line `start`.
    pub fn steps(&self, lines: &[String], start: usize) -> Vec<String> {
        let mut steps: Vec<String> = Vec::new();
        let mut state = ScanState::SeekingAnchor;

        for line in lines.iter().skip(start) {
            match step_action(state, line, self.classify_step_line(line)) {
                Action::Push(step) => {
                    steps.push(step);
                    state = ScanState::Collecting;
                }
                Action::Append(text) => {
                    let Some(last) = steps.last_mut() else { continue };
                    if self
                        .max_continuation_chars
                        .is_some_and(|max| last.chars().count() + 1 + text.chars().count() > max)
                    {
                        debug!("Step continuation exceeds limit, ending scan");
                        break;
                    }
                    *last = format!("{last} {text}").trim().to_string();
                }
                Action::Stop => break,
                Action::Skip => {}
            }
        }

        steps
    }

    fn has_measurement(&self, lower: &str) -> bool {
        tokens(lower).any(|word| self.keywords.measurement_tokens.iter().any(|t| t == word))
    }
}

fn ingredient_action(state: ScanState, line: &str, kind: IngredientLine<'_>) -> Action {
    match (kind, state) {
        (IngredientLine::Bullet(rest), _) => Action::Push(rest.to_string()),
        (IngredientLine::Subheading | IngredientLine::Measured, _) => Action::Push(line.to_string()),
        // A numbered line before anything else still carries a digit
        (IngredientLine::Numbered, ScanState::SeekingAnchor) => Action::Push(line.to_string()),
        (_, ScanState::SeekingAnchor) => Action::Skip,
        _ => Action::Stop,
    }
}

fn step_action(state: ScanState, line: &str, step_line: StepLine<'_>) -> Action {
    let collecting = state == ScanState::Collecting;
    if step_line.kind == StepLineKind::Boundary || (step_line.terminates && collecting) {
        return Action::Stop;
    }

    match step_line.kind {
        StepLineKind::Numbered(rest) => Action::Push(rest.to_string()),
        // Bullets before the first numbered step still belong to the ingredients
        StepLineKind::Bullet(rest) if collecting => Action::Push(rest.to_string()),
        StepLineKind::Bullet(_) | StepLineKind::Plain if collecting => {
            Action::Append(line.to_string())
        }
        _ => Action::Skip,
    }
}

/// Normalize line breaks, trim, drop blank lines and collapse adjacent repeats.
pub fn prepare_lines(description: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in description.split(['\r', '\n']).map(str::trim) {
        if line.is_empty() || lines.last().is_some_and(|last| last == line) {
            continue;
        }
        lines.push(line.to_string());
    }
    lines
}

fn is_boundary(lower: &str) -> bool {
    lower.starts_with('#') || lower.starts_with("http")
}

fn bullet_text(line: &str) -> Option<&str> {
    BULLET_ITEM
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn step_text(line: &str) -> Option<&str> {
    STEP_ITEM
        .captures(line)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim())
}

fn inline_ingredients(lines: &[String]) -> Vec<String> {
    let joined = lines.join("\n");
    let Some(rest) = INLINE_INGREDIENTS
        .captures(&joined)
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };

    let first_line = rest.as_str().split('\n').next().unwrap_or_default();
    first_line
        .split(',')
        .map(|token| token.trim_matches(|c| matches!(c, ' ' | '.' | ';' | '-')))
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prepare_lines_trims_and_collapses_repeats() {
        let prepared = prepare_lines("  Soup \r\n\r\nSoup\n2 cups stock\nSoup\n\n");
        assert_eq!(prepared, vec!["Soup", "2 cups stock", "Soup"]);
    }

    #[test]
    fn test_bulleted_ingredients_stop_at_method() {
        let segmenter = Segmenter::default();
        let scan = segmenter.ingredients(&lines(&[
            "Ingredients:",
            "- 2 cups flour",
            "- 1 egg",
            "Method",
            "Mix well",
        ]));

        assert_eq!(scan.items, vec!["2 cups flour", "1 egg"]);
        assert_eq!(scan.stop, 3);
    }

    #[test]
    fn test_ingredients_without_anchor_start_at_top() {
        let segmenter = Segmenter::default();
        let scan = segmenter.ingredients(&lines(&[
            "Best weeknight dinner",
            "200g pasta",
            "• parmesan",
            "Garnish with basil",
            "Boil the water",
        ]));

        assert_eq!(
            scan.items,
            vec!["200g pasta", "parmesan", "Garnish with basil"]
        );
        assert_eq!(scan.stop, 4);
    }

    #[test]
    fn test_numbered_line_ends_ingredients_once_collecting() {
        let segmenter = Segmenter::default();
        let scan = segmenter.ingredients(&lines(&[
            "You need:",
            "1 tin chickpeas",
            "1) Drain the chickpeas",
        ]));
        assert_eq!(scan.items, vec!["1 tin chickpeas"]);
        assert_eq!(scan.stop, 2);
    }

    #[test]
    fn test_noise_before_first_ingredient_is_skipped() {
        let segmenter = Segmenter::default();
        let scan = segmenter.ingredients(&lines(&[
            "Ingredients",
            "#dinner",
            "Serves four hungry people",
            "so good",
            "a handful of spinach",
            "https://example.com",
        ]));
        assert_eq!(scan.items, vec!["a handful of spinach"]);
        assert_eq!(scan.stop, 5);
    }

    #[test]
    fn test_inline_ingredient_fallback() {
        let segmenter = Segmenter::default();
        let scan = segmenter.ingredients(&lines(&[
            "Ingredients: rice, beans; , salsa.",
            "Enjoy!",
        ]));
        assert_eq!(scan.items, vec!["rice", "beans", "salsa"]);
        assert_eq!(scan.stop, 1);
    }

    #[test]
    fn test_no_ingredients_anywhere() {
        let segmenter = Segmenter::default();
        let scan = segmenter.ingredients(&lines(&["So tasty", "Really good"]));
        assert!(scan.items.is_empty());
        assert_eq!(scan.stop, 0);
    }

    #[test]
    fn test_numbered_steps_and_continuation() {
        let segmenter = Segmenter::default();
        let steps = segmenter.steps(
            &lines(&["1. Mix flour and egg", "2. Bake at 350", "until golden"]),
            0,
        );
        assert_eq!(steps, vec!["Mix flour and egg", "Bake at 350 until golden"]);
    }

    #[test]
    fn test_step_prefix_and_separators() {
        let segmenter = Segmenter::default();
        let steps = segmenter.steps(&lines(&["Step 1: Whisk", "STEP 2- Pour", "3) Serve warm"]), 0);
        assert_eq!(steps, vec!["Whisk", "Pour", "Serve warm"]);
    }

    #[test]
    fn test_bullets_before_first_step_are_ignored() {
        let segmenter = Segmenter::default();
        let steps = segmenter.steps(
            &lines(&["- olive oil", "1. Warm the oil", "- add garlic"]),
            0,
        );
        assert_eq!(steps, vec!["Warm the oil", "add garlic"]);
    }

    #[test]
    fn test_headings_are_skipped() {
        let segmenter = Segmenter::default();
        let steps = segmenter.steps(&lines(&["Method:", "1. Whisk eggs"]), 0);
        assert_eq!(steps, vec!["Whisk eggs"]);
    }

    #[test]
    fn test_terminators_end_steps_only_after_first_step() {
        let segmenter = Segmenter::default();
        let steps = segmenter.steps(
            &lines(&[
                "Serves 2",
                "1. Whisk eggs",
                "Share with a friend",
                "2. Never reached",
            ]),
            0,
        );
        assert_eq!(steps, vec!["Whisk eggs"]);
    }

    #[test]
    fn test_hashtags_end_steps() {
        let segmenter = Segmenter::default();
        let steps = segmenter.steps(&lines(&["1. Whisk eggs", "#breakfast", "2. Fry"]), 0);
        assert_eq!(steps, vec!["Whisk eggs"]);
    }

    #[test]
    fn test_continuation_limit() {
        let segmenter = Segmenter::default().with_max_continuation(Some(25));
        let steps = segmenter.steps(
            &lines(&["1. Whisk eggs", "until fluffy", "a stray caption that keeps going"]),
            0,
        );
        assert_eq!(steps, vec!["Whisk eggs until fluffy"]);
    }

    #[test]
    fn test_continuation_limit_counts_characters() {
        let segmenter = Segmenter::default().with_max_continuation(Some(24));
        let steps = segmenter.steps(&lines(&["1. Saut\u{e9} oignons", "\u{e0} feu doux"]), 0);
        assert_eq!(steps, vec!["Saut\u{e9} oignons \u{e0} feu doux"]);
    }

    #[test]
    fn test_classify_ingredient_lines() {
        let segmenter = Segmenter::default();
        assert_eq!(segmenter.classify_ingredient_line("#vegan"), IngredientLine::Boundary);
        assert_eq!(segmenter.classify_ingredient_line("Method:"), IngredientLine::Stopword);
        assert_eq!(segmenter.classify_ingredient_line("2. Stir"), IngredientLine::Numbered);
        assert_eq!(
            segmenter.classify_ingredient_line("— 1 lemon"),
            IngredientLine::Bullet("1 lemon")
        );
        assert_eq!(
            segmenter.classify_ingredient_line("For the dressing"),
            IngredientLine::Subheading
        );
        assert_eq!(
            segmenter.classify_ingredient_line("a pinch of salt, 1 clove garlic"),
            IngredientLine::Measured
        );
        assert_eq!(segmenter.classify_ingredient_line("salt"), IngredientLine::Plain);
        // Units match whole words only
        assert_eq!(segmenter.classify_ingredient_line("grated cheese"), IngredientLine::Plain);
    }

    #[test]
    fn test_segment_full_caption() {
        let caption = "Creamy tomato pasta 🍅\n\
            Ingredients:\n\
            - 200g pasta\n\
            - 1 can tomatoes\n\
            - 2 cloves garlic\n\
            Method:\n\
            1. Boil the pasta\n\
            2. Simmer tomatoes and garlic\n\
            for ten minutes\n\
            3. Toss together\n\
            #pasta #dinner";

        let segmented = Segmenter::default().segment(caption);
        assert_eq!(
            segmented.ingredients,
            vec!["200g pasta", "1 can tomatoes", "2 cloves garlic"]
        );
        assert_eq!(
            segmented.steps,
            vec![
                "Boil the pasta",
                "Simmer tomatoes and garlic for ten minutes",
                "Toss together"
            ]
        );
    }

    #[test]
    fn test_custom_keywords() {
        let keywords = SegmenterKeywords {
            ingredient_anchors: vec!["zutaten".to_string()],
            ingredient_stopwords: vec!["zubereitung".to_string()],
            ..SegmenterKeywords::default()
        };
        let scan = Segmenter::new(keywords).ingredients(&lines(&[
            "Zutaten",
            "- Mehl",
            "Zubereitung",
        ]));
        assert_eq!(scan.items, vec!["Mehl"]);
        assert_eq!(scan.stop, 2);
    }
}
