//! Crossover operators: combine two parent prompts' token sequences into
//! one child.

use promptweave_core::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverOperation {
    SinglePoint,
    Uniform,
    Semantic,
}

impl CrossoverOperation {
    pub fn tag(&self) -> &'static str {
        match self {
            CrossoverOperation::SinglePoint => "single_point",
            CrossoverOperation::Uniform => "uniform",
            CrossoverOperation::Semantic => "semantic",
        }
    }

    pub fn apply(&self, a: &str, b: &str, random: &dyn RandomSource) -> String {
        match self {
            CrossoverOperation::SinglePoint => single_point(a, b, random),
            CrossoverOperation::Uniform => uniform(a, b, random),
            CrossoverOperation::Semantic => semantic(a, b, random),
        }
    }
}

fn single_point(a: &str, b: &str, random: &dyn RandomSource) -> String {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    let bound = tokens_a.len().min(tokens_b.len());
    if bound == 0 {
        return format!("{a} {b}").trim().to_string();
    }
    // p in (0, bound): at least 1, strictly less than bound when bound > 1.
    let p = if bound == 1 { 1 } else { 1 + random.gen_below(bound - 1) };
    let mut child: Vec<&str> = tokens_a[..p.min(tokens_a.len())].to_vec();
    child.extend_from_slice(&tokens_b[p.min(tokens_b.len())..]);
    child.join(" ")
}

fn uniform(a: &str, b: &str, random: &dyn RandomSource) -> String {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    let bound = tokens_a.len().min(tokens_b.len());
    let mut child: Vec<&str> = Vec::with_capacity(tokens_a.len().max(tokens_b.len()));
    for i in 0..bound {
        if random.gen_bool(0.5) {
            child.push(tokens_a[i]);
        } else {
            child.push(tokens_b[i]);
        }
    }
    if tokens_a.len() > bound {
        child.extend_from_slice(&tokens_a[bound..]);
    } else if tokens_b.len() > bound {
        child.extend_from_slice(&tokens_b[bound..]);
    }
    child.join(" ")
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch == '.' || ch == '!' || ch == '?' {
            let end = i + ch.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn semantic(a: &str, b: &str, _random: &dyn RandomSource) -> String {
    let sentences_a = split_sentences(a);
    let sentences_b = split_sentences(b);
    let mut child = Vec::with_capacity(sentences_a.len() + sentences_b.len());
    let mut ia = 0;
    let mut ib = 0;
    while ia < sentences_a.len() || ib < sentences_b.len() {
        if ia < sentences_a.len() {
            child.push(sentences_a[ia]);
            ia += 1;
        }
        if ib < sentences_b.len() {
            child.push(sentences_b[ib]);
            ib += 1;
        }
    }
    child.join(" ")
}
