// ABOUTME: System prompts for the analysis and narration model calls
// ABOUTME: Encodes the JSON action contract and the known-schema digest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! Prompt builders for the two model calls.
//!
//! The *analysis* prompt instructs the model to reply with exactly one JSON
//! object in one of the two accepted shapes; the Action Resolver enforces the
//! contract and fails closed on anything else. The *narration* prompt turns a
//! formatted data preview into operator-facing prose and never sees raw SQL
//! or raw rows.

use crate::catalog::SchemaCatalog;

/// Build the system prompt for the analysis call
#[must_use]
pub fn analysis_prompt(catalog: &SchemaCatalog) -> String {
    format!(
        "Você é o assistente de análise do restaurante. Responda SEMPRE com um \
único objeto JSON, sem texto extra, em um destes dois formatos:\n\
{{\"action\": \"respond\", \"message\": \"...\"}} quando puder responder \
diretamente, ou\n\
{{\"action\": \"query\", \"sql\": \"SELECT ...\", \"reason\": \"...\"}} quando \
precisar consultar o banco.\n\n\
Regras para SQL:\n\
- PostgreSQL, somente SELECT, uma única instrução, sem CTE (WITH).\n\
- Nomes de tabela e coluna SEMPRE entre aspas duplas (ex.: \"Pedido\".\"criadoEm\").\n\
- Use EXTRACT/DATE_TRUNC/TO_CHAR para datas; nunca DATE_FORMAT, YEAR(), CURDATE().\n\
- Valores monetários estão em centavos (colunas *Cents); divida por 100.\n\
- Inclua LIMIT.\n\n\
Esquema disponível:\n{}",
        catalog.digest()
    )
}

/// Build the user message for the narration call
///
/// Receives the formatted preview only; raw SQL and raw rows never reach the
/// narration context.
#[must_use]
pub fn narration_prompt(question: &str, preview: &str) -> String {
    format!(
        "Pergunta do operador: {question}\n\n\
Dados já consultados e formatados:\n{preview}\n\n\
Responda a pergunta em português, em tom direto e cordial, usando apenas os \
dados acima. Não invente números e não mencione SQL."
    )
}
