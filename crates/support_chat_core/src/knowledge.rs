//! crates/support_chat_core/src/knowledge.rs
//!
//! Serializes the FAQ and document collections into the text blob that grounds
//! every outbound request, and wraps it with the answering instructions.

use crate::domain::{DocumentEntry, FaqEntry};
use std::fmt::Write;

const HEADER: &str = "COMPANY KNOWLEDGE BASE:\n\n";
const FAQ_HEADER: &str = "=== FREQUENTLY ASKED QUESTIONS ===\n\n";
const DOCUMENTS_HEADER: &str = "\n=== COMPANY DOCUMENTS ===\n\n";
const EMPTY_PLACEHOLDER: &str = "No FAQs or documents have been added yet.\n";

const INSTRUCTIONS: &str = r#"INSTRUCTIONS:
You are a helpful customer support assistant. Answer the user's question based ONLY on the information provided in the knowledge base above. If the answer is not in the knowledge base, politely say you don't have that information and suggest they contact support for more details.

Be friendly, concise, and professional. If multiple FAQs or documents are relevant, reference them in your answer."#;

/// Builds the knowledge-base text. FAQs always come before documents and both
/// keep insertion order; entries are numbered from 1.
pub fn build_knowledge_base(faqs: &[FaqEntry], documents: &[DocumentEntry]) -> String {
    let mut kb = String::from(HEADER);

    if !faqs.is_empty() {
        kb.push_str(FAQ_HEADER);
        for (idx, faq) in faqs.iter().enumerate() {
            let n = idx + 1;
            let _ = write!(kb, "Q{n}: {}\nA{n}: {}\n\n", faq.question, faq.answer);
        }
    }

    if !documents.is_empty() {
        kb.push_str(DOCUMENTS_HEADER);
        for (idx, doc) in documents.iter().enumerate() {
            let _ = write!(
                kb,
                "Document {}: {}\nContent: {}\n\n",
                idx + 1,
                doc.name,
                doc.content
            );
        }
    }

    if faqs.is_empty() && documents.is_empty() {
        kb.push_str(EMPTY_PLACEHOLDER);
    }

    kb
}

/// The content of the synthetic final user turn.
pub fn build_prompt(knowledge_base: &str, question: &str) -> String {
    format!("{knowledge_base}\n\n{INSTRUCTIONS}\n\nUSER QUESTION: {question}")
}
