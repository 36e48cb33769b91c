// ABOUTME: Static known-schema catalog for the back-office PostgreSQL database
// ABOUTME: Drives identifier-quoting checks, shape detection, and the analysis prompt digest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Known-Schema Catalog
//!
//! A static description of the back-office schema. The schema is managed by a
//! Prisma-style migration tool, so table names are PascalCase and column
//! names are camelCase; both must be double-quoted in raw SQL or PostgreSQL
//! folds them to lowercase and reports them as missing.
//!
//! The catalog is read-only, built once at process start, and shared freely
//! across concurrent requests.

use std::sync::LazyLock;

/// A table in the back-office schema
#[derive(Debug, Clone)]
pub struct TableSpec {
    /// Unquoted table name as declared by the migrations (PascalCase)
    pub name: &'static str,
    /// Column names in declaration order (camelCase)
    pub columns: &'static [&'static str],
    /// Human-readable relationship note, used in the analysis prompt digest
    pub relationships: &'static str,
}

/// The full known-schema catalog
#[derive(Debug)]
pub struct SchemaCatalog {
    tables: Vec<TableSpec>,
}

impl SchemaCatalog {
    /// All table specs, in declaration order
    #[must_use]
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Unquoted names of every known table
    #[must_use]
    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|t| t.name).collect()
    }

    /// Look up a table spec by its unquoted name (case-sensitive)
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Render a compact schema digest for the analysis prompt
    #[must_use]
    pub fn digest(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str(&format!(
                "\"{}\"({}) -- {}\n",
                table.name,
                table.columns.join(", "),
                table.relationships
            ));
        }
        out
    }
}

/// Process-wide catalog instance, built once
pub static CATALOG: LazyLock<SchemaCatalog> = LazyLock::new(|| SchemaCatalog {
    tables: vec![
        TableSpec {
            name: "Cliente",
            columns: &[
                "id",
                "nome",
                "telefone",
                "email",
                "endereco",
                "bairro",
                "criadoEm",
            ],
            relationships: "um cliente tem muitos pedidos",
        },
        TableSpec {
            name: "Pedido",
            columns: &[
                "id",
                "clienteId",
                "status",
                "tipo",
                "totalCents",
                "trocoCents",
                "criadoEm",
            ],
            relationships: "clienteId referencia \"Cliente\".id",
        },
        TableSpec {
            name: "ItemPedido",
            columns: &["id", "pedidoId", "produtoId", "quantidade", "precoCents"],
            relationships: "pedidoId referencia \"Pedido\".id, produtoId referencia \"Produto\".id",
        },
        TableSpec {
            name: "Produto",
            columns: &["id", "nome", "categoria", "precoCents", "ativo"],
            relationships: "itens de pedido apontam para produtos",
        },
        TableSpec {
            name: "Entrega",
            columns: &["id", "pedidoId", "entregadorId", "status", "saiuEm", "entregueEm"],
            relationships: "pedidoId referencia \"Pedido\".id",
        },
        TableSpec {
            name: "Entregador",
            columns: &["id", "nome", "telefone", "ativo"],
            relationships: "entregas apontam para entregadores",
        },
    ],
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert!(CATALOG.table("Cliente").is_some());
        assert!(CATALOG.table("cliente").is_none());
        assert!(CATALOG.table("Pedido").is_some());
    }

    #[test]
    fn test_digest_quotes_every_table() {
        let digest = CATALOG.digest();
        for name in CATALOG.table_names() {
            assert!(digest.contains(&format!("\"{name}\"")));
        }
    }
}
