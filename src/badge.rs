/// Turns a badge slug such as `first-pull-request` into a label
/// (`First Pull Request`). Words follow Unicode rules so accented
/// letters start a word (`émile-zola` becomes `Émile Zola`)
pub fn badge_label(slug: &str) -> String {
    let mut label = String::with_capacity(slug.len());
    let mut in_word = false;
    for c in slug.chars() {
        let c = if c == '-' { ' ' } else { c };
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && !in_word {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        in_word = is_word;
    }
    label
}
