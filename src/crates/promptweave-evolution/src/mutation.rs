//! Mutation strategies: each takes one individual's content and returns a
//! modified prompt plus the tag(s) describing what was applied.

use promptweave_core::RandomSource;
use promptweave_router::{RouteRequest, Router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStrategy {
    ZeroOrder,
    FirstOrder,
    SemanticRewrite,
    Hypermutation,
}

impl MutationStrategy {
    pub fn tag(&self) -> &'static str {
        match self {
            MutationStrategy::ZeroOrder => "zero_order",
            MutationStrategy::FirstOrder => "first_order",
            MutationStrategy::SemanticRewrite => "semantic_rewrite",
            MutationStrategy::Hypermutation => "hypermutation",
        }
    }
}

/// Applies `strategy` to `content`, returning the mutated prompt and the
/// ordered tags to append to the individual's `mutations` list.
///
/// `router` is consulted only by `semantic_rewrite`; its absence, or any
/// failure from it, falls back to `first_order` and the returned tags
/// record both the attempted and the applied strategy.
pub async fn apply_mutation(
    strategy: MutationStrategy,
    content: &str,
    vocabulary: &[String],
    router: Option<&Router>,
    random: &dyn RandomSource,
) -> (String, Vec<String>) {
    match strategy {
        MutationStrategy::ZeroOrder => (
            zero_order(content, vocabulary, random),
            vec![MutationStrategy::ZeroOrder.tag().to_string()],
        ),
        MutationStrategy::FirstOrder => (
            first_order(content, random),
            vec![MutationStrategy::FirstOrder.tag().to_string()],
        ),
        MutationStrategy::SemanticRewrite => semantic_rewrite(content, router, random).await,
        MutationStrategy::Hypermutation => hypermutation(content, vocabulary, random),
    }
}

fn zero_order(content: &str, vocabulary: &[String], random: &dyn RandomSource) -> String {
    let mut tokens: Vec<String> = content.split_whitespace().map(String::from).collect();
    if tokens.is_empty() || vocabulary.is_empty() {
        return content.to_string();
    }
    let idx = random.gen_below(tokens.len());
    let replacement = vocabulary[random.gen_below(vocabulary.len())].clone();
    tokens[idx] = replacement;
    tokens.join(" ")
}

fn first_order(content: &str, random: &dyn RandomSource) -> String {
    let mut tokens: Vec<String> = content.split_whitespace().map(String::from).collect();
    if tokens.is_empty() {
        return content.to_string();
    }
    match random.gen_below(3) {
        0 => {
            // insert: duplicate a random existing token at a random position.
            let source = tokens[random.gen_below(tokens.len())].clone();
            let pos = random.gen_below(tokens.len() + 1);
            tokens.insert(pos, source);
        }
        1 => {
            if tokens.len() > 1 {
                let pos = random.gen_below(tokens.len());
                tokens.remove(pos);
            }
        }
        _ => {
            if tokens.len() > 1 {
                let picks = random.sample_indices(tokens.len(), 2);
                tokens.swap(picks[0], picks[1]);
            }
        }
    }
    tokens.join(" ")
}

async fn semantic_rewrite(
    content: &str,
    router: Option<&Router>,
    random: &dyn RandomSource,
) -> (String, Vec<String>) {
    let sentences: Vec<&str> = content
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let rewritten = match (router, sentences.is_empty()) {
        (Some(router), false) => {
            let idx = random.gen_below(sentences.len());
            let prompt = format!(
                "Rewrite the following sentence, preserving its meaning: {}",
                sentences[idx]
            );
            match router.route(RouteRequest::new(prompt)).await {
                Ok(response) => {
                    let mut rebuilt = sentences.to_vec();
                    let owned = response.text;
                    rebuilt[idx] = owned.as_str();
                    Some(rebuilt.join(" "))
                }
                Err(_) => None,
            }
        }
        _ => None,
    };

    match rewritten {
        Some(text) => (text, vec![MutationStrategy::SemanticRewrite.tag().to_string()]),
        None => {
            let fallback = first_order(content, random);
            (
                fallback,
                vec![
                    MutationStrategy::SemanticRewrite.tag().to_string(),
                    MutationStrategy::FirstOrder.tag().to_string(),
                ],
            )
        }
    }
}

fn hypermutation(content: &str, vocabulary: &[String], random: &dyn RandomSource) -> (String, Vec<String>) {
    let count = 2 + random.gen_below(4); // inclusive range [2, 5]
    let mut current = content.to_string();
    let mut tags = vec![MutationStrategy::Hypermutation.tag().to_string()];
    for _ in 0..count {
        let sub = if random.gen_bool(0.5) {
            MutationStrategy::ZeroOrder
        } else {
            MutationStrategy::FirstOrder
        };
        current = match sub {
            MutationStrategy::ZeroOrder => zero_order(&current, vocabulary, random),
            MutationStrategy::FirstOrder => first_order(&current, random),
            _ => unreachable!("hypermutation only draws zero_order/first_order"),
        };
        tags.push(sub.tag().to_string());
    }
    (current, tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_core::SeededRandom;

    #[test]
    fn zero_order_replaces_one_token() {
        let random = SeededRandom::new(1);
        let vocab = vec!["zeta".to_string()];
        let mutated = zero_order("alpha beta gamma", &vocab, &random);
        assert!(mutated.split_whitespace().any(|t| t == "zeta"));
        assert_eq!(mutated.split_whitespace().count(), 3);
    }

    #[test]
    fn zero_order_is_noop_with_empty_vocabulary() {
        let random = SeededRandom::new(1);
        assert_eq!(zero_order("alpha beta", &[], &random), "alpha beta");
    }

    #[test]
    fn first_order_changes_token_count_or_order() {
        let random = SeededRandom::new(7);
        let original = "alpha beta gamma";
        let mutated = first_order(original, &random);
        assert!(mutated != original || original.split_whitespace().count() <= 1);
    }

    #[test]
    fn hypermutation_applies_between_two_and_five_steps() {
        let random = SeededRandom::new(3);
        let vocab = vec!["x".to_string(), "y".to_string()];
        let (_content, tags) = hypermutation("alpha beta gamma delta epsilon", &vocab, &random);
        // one "hypermutation" tag plus 2..=5 sub-tags
        assert!(tags.len() >= 3 && tags.len() <= 6);
        assert_eq!(tags[0], "hypermutation");
        for tag in &tags[1..] {
            assert!(tag == "zero_order" || tag == "first_order");
        }
    }

    #[tokio::test]
    async fn semantic_rewrite_without_router_falls_back() {
        let random = SeededRandom::new(5);
        let (content, tags) = semantic_rewrite("One sentence. Two sentences.", None, &random).await;
        assert_eq!(tags, vec!["semantic_rewrite", "first_order"]);
        assert!(!content.is_empty());
    }
}
