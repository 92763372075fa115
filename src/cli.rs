//! Interface de linha de comando do lastpost baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, status, export, clear)
//! e flags globais (--session, --state-dir, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// lastpost: verifica a data do post mais recente de uma lista de perfis, com retomada.
#[derive(Debug, Parser)]
#[command(name = "lastpost", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Chave da sessão salva (sobrepõe `session` do arquivo de configuração).
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Diretório dos checkpoints (sobrepõe `state_dir`).
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = "lastpost.toml")]
    pub config: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Processa os identificadores de um arquivo (.csv usa a primeira coluna, outros uma linha por item).
    Run {
        /// Arquivo com os identificadores.
        input: PathBuf,

        /// Atraso mínimo entre itens, em segundos (1-120).
        #[arg(long)]
        min_delay: Option<u64>,

        /// Atraso máximo entre itens, em segundos (1-120).
        #[arg(long)]
        max_delay: Option<u64>,

        /// Ignora e descarta a sessão salva, começando do zero.
        #[arg(long, default_value_t = false)]
        no_resume: bool,

        /// Tentativas por identificador, incluindo a primeira.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Arquivo CSV de saída (padrão: results_<data>.csv).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Mostra o progresso da sessão salva.
    Status,

    /// Exporta os resultados da sessão salva para CSV.
    Export {
        /// Arquivo CSV de saída (padrão: results_<data>.csv).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Remove a sessão salva.
    Clear,
}
