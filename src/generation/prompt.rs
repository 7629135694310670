// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

const INSTRUCTION: &str = "Answer the question using the reference documents below.";

/// Build a retrieval-augmented prompt
///
/// Passages are labeled `[Document i]` (1-based) in the order given, so the
/// model can refer back to them.
pub fn build_rag_prompt(query: &str, context: &[String]) -> String {
    let documents = context
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("[Document {}]\n{}", i + 1, passage))
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!(
        "{}\n\n[Reference documents]\n{}\n\n[Question]\n{}\n\n[Answer]\n",
        INSTRUCTION, documents, query
    );

    tracing::debug!(
        "🎨 Built prompt ({} passages, {} chars)",
        context.len(),
        prompt.len()
    );

    prompt
}
