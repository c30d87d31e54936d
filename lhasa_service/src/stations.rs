/// Station catalog for the pluviometric network.
///
/// Defines the canonical list of rain gauges whose historical logs and
/// zones this service reconciles. This is the single source of truth for
/// station codes and historical file tokens. Other modules resolve
/// stations through `lookup` rather than hardcoding names.

use crate::model::StationNotFound;
use crate::zones::normalize_name;

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// One monitoring station.
#[derive(Debug, PartialEq, Eq)]
pub struct StationDefinition {
    /// Zone/station code shared with the zone repository.
    pub code: u32,
    /// Canonical upper-case station name.
    pub name: &'static str,
    /// Token that prefixes this station's historical log file names.
    pub file_token: &'static str,
}

/// How to search the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    ByCode(u32),
    ByName(&'a str),
    ByFileToken(&'a str),
}

/// All stations, ordered by code. Code 14 was retired upstream.
pub static STATION_REGISTRY: &[StationDefinition] = &[
    StationDefinition { code: 1, name: "VIDIGAL", file_token: "vidigal" },
    StationDefinition { code: 2, name: "URCA", file_token: "urca" },
    StationDefinition { code: 3, name: "ROCINHA", file_token: "rocinha" },
    StationDefinition { code: 4, name: "TIJUCA", file_token: "tijuca" },
    StationDefinition { code: 5, name: "SANTA TERESA", file_token: "santa_teresa" },
    StationDefinition { code: 6, name: "COPACABANA", file_token: "copacabana" },
    StationDefinition { code: 7, name: "GRAJAU", file_token: "grajau" },
    StationDefinition { code: 8, name: "ILHA DO GOVERNADOR", file_token: "ilha_do_governador" },
    StationDefinition { code: 9, name: "PENHA", file_token: "penha" },
    StationDefinition { code: 10, name: "MADUREIRA", file_token: "madureira" },
    StationDefinition { code: 11, name: "IRAJA", file_token: "iraja" },
    StationDefinition { code: 12, name: "BANGU", file_token: "bangu" },
    StationDefinition { code: 13, name: "PIEDADE", file_token: "piedade" },
    StationDefinition { code: 15, name: "SAUDE", file_token: "saude" },
    StationDefinition { code: 16, name: "JARDIM BOTANICO", file_token: "jardim_botanico" },
    StationDefinition { code: 17, name: "BARRA/ITANHANGA", file_token: "barrinha" },
    StationDefinition { code: 18, name: "JACAREPAGUA/CIDADE DE DEUS", file_token: "cidade_de_deus" },
    StationDefinition { code: 19, name: "BARRA/RIO CENTRO", file_token: "riocentro" },
    StationDefinition { code: 20, name: "GUARATIBA", file_token: "guaratiba" },
    StationDefinition { code: 21, name: "ESTRADA GRAJAU/JACAREPAGUA", file_token: "grajau_jacarepagua" },
    StationDefinition { code: 22, name: "SANTA CRUZ", file_token: "santa_cruz" },
    StationDefinition { code: 23, name: "GRANDE MEIER", file_token: "grande_meier" },
    StationDefinition { code: 24, name: "ANCHIETA", file_token: "anchieta" },
    StationDefinition { code: 25, name: "GROTA FUNDA", file_token: "grota_funda" },
    StationDefinition { code: 26, name: "CAMPO GRANDE", file_token: "campo_grande" },
    StationDefinition { code: 27, name: "SEPETIBA", file_token: "sepetiba" },
    StationDefinition { code: 28, name: "ALTO DA BOA VISTA", file_token: "alto_da_boa_vista" },
    StationDefinition { code: 29, name: "AV. BRASIL/MENDANHA", file_token: "av_brasil_mendanha" },
    StationDefinition { code: 30, name: "RECREIO DOS BANDEIRANTES", file_token: "recreio" },
    StationDefinition { code: 31, name: "LARANJEIRAS", file_token: "laranjeiras" },
    StationDefinition { code: 32, name: "SAO CRISTOVAO", file_token: "sao_cristovao" },
    StationDefinition { code: 33, name: "TIJUCA/MUDA", file_token: "tijuca_muda" },
];

/// Looks up a station. Name and token matching is case-insensitive and
/// exact; names are also diacritic-folded so "São Cristóvão" resolves.
///
/// # Errors
/// `StationNotFound` when nothing matches. Callers treat this as a routing
/// decision (quarantine the input), not a fatal error.
pub fn lookup(by: Lookup<'_>) -> Result<&'static StationDefinition, StationNotFound> {
    let found = match by {
        Lookup::ByCode(code) => STATION_REGISTRY.iter().find(|s| s.code == code),
        Lookup::ByName(name) => {
            let wanted = normalize_name(name);
            STATION_REGISTRY.iter().find(|s| s.name == wanted)
        }
        Lookup::ByFileToken(token) => {
            let wanted = token.trim();
            STATION_REGISTRY
                .iter()
                .find(|s| s.file_token.eq_ignore_ascii_case(wanted))
        }
    };

    found.ok_or_else(|| {
        StationNotFound(match by {
            Lookup::ByCode(code) => format!("code {}", code),
            Lookup::ByName(name) => format!("name '{}'", name),
            Lookup::ByFileToken(token) => format!("file token '{}'", token),
        })
    })
}

/// Returns the codes of every catalogued station.
pub fn all_station_codes() -> Vec<u32> {
    STATION_REGISTRY.iter().map(|s| s.code).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
