/// Test fixtures: representative payloads for every ingest source.
///
/// These are truncated to the minimum needed to exercise the parsers but
/// keep the real envelopes.
///
/// Historical rain log (`<token>_<YYYYMM>_<suffix>.txt`):
///   5 header lines, then one line per 15-minute reading:
///     columns 0..26  date and time, padded with spaces
///     columns 26..   m15 h01 h04 h24 h96 (mm), space separated,
///                    "ND" where the gauge reported nothing
///
/// INMET station list (`/estacoes/T`):
///   [ { CD_ESTACAO, DC_NOME, VL_LATITUDE, VL_LONGITUDE, SG_ESTADO,
///       CD_SITUACAO, ... } ]
///   Coordinates arrive as strings.
///
/// INMET station data (`/estacao/{start}/{end}/{code}`):
///   [ { DT_MEDICAO "YYYY-MM-DD", HR_MEDICAO "HHMM", CHUVA, ... } ]
///   CHUVA may be a string, a number or null. Hours not yet observed are
///   present with null values.
///
/// Legacy bulk endpoint (`?queryTime=YYYYMMDD_HHMM`):
///   { "objects": [ { name, read_at, data: { m15, h01, h02, h03, h04,
///                                            h24, h96, mes } } ] }

/// Tijuca log for January 2024: the 10h window peaks at 10:30 (h01 22.8),
/// the 11h window is dry apart from one ND line.
#[cfg(test)]
pub(crate) fn fixture_tijuca_log() -> &'static str {
    "Estacao: Tijuca\n\
     Codigo: 4\n\
     Periodo: 01/2024\n\
     Unidade: mm\n\
     Data       Hora          15 min   01 h   04 h   24 h   96 h\n\
     01/01/2024 10:00:00             2.4   10.2   12.6   45.0   80.0\n\
     01/01/2024 10:15:00             5.0   14.8   17.2   49.6   84.6\n\
     01/01/2024 10:30:00             8.2   22.8   25.4   57.8   92.8\n\
     01/01/2024 10:45:00             1.2   22.8   25.4   57.8   92.8\n\
     01/01/2024 11:00:00             0.0    0.0   25.4   57.8   92.8\n\
     01/01/2024 11:15:00              ND     ND     ND     ND     ND\n\
     01/01/2024 11:30:00             0.0    0.0   25.4   57.8   92.8\n\
     01/01/2024 11:45:00             0.0    0.0   25.4   57.8   92.8\n"
}

/// A log whose first data line is mid-hour (10:15), with one garbled
/// date and one negative value.
#[cfg(test)]
pub(crate) fn fixture_misaligned_log() -> &'static str {
    "h1\nh2\nh3\nh4\nh5\n\
     01/01/2024 10:15:00             3.0   11.0   12.0   30.0   60.0\n\
     01/01/2024 10:30:00             4.0   -9.0   12.0   30.0   60.0\n\
     xx/01/2024 10:40:00             9.0    9.0    9.0    9.0    9.0\n\
     01/01/2024 10:45:00             1.0   12.5   12.0   30.0   60.0\n"
}

/// Two operating RJ stations, one RJ station under maintenance and one
/// from another state.
#[cfg(test)]
pub(crate) fn fixture_inmet_stations_json() -> &'static str {
    r#"[
      {
        "CD_ESTACAO": "A652",
        "DC_NOME": "RIO DE JANEIRO - FORTE DE COPACABANA",
        "VL_LATITUDE": "-22.98833333",
        "VL_LONGITUDE": "-43.19055555",
        "SG_ESTADO": "RJ",
        "CD_SITUACAO": "Operante",
        "TP_ESTACAO": "Automatica"
      },
      {
        "CD_ESTACAO": "A636",
        "DC_NOME": "RIO DE JANEIRO - JACAREPAGUA",
        "VL_LATITUDE": "-22.94",
        "VL_LONGITUDE": "-43.40277777",
        "SG_ESTADO": "RJ",
        "CD_SITUACAO": "Operante",
        "TP_ESTACAO": "Automatica"
      },
      {
        "CD_ESTACAO": "A621",
        "DC_NOME": "RIO DE JANEIRO - VILA MILITAR",
        "VL_LATITUDE": "-22.86138888",
        "VL_LONGITUDE": "-43.41138888",
        "SG_ESTADO": "RJ",
        "CD_SITUACAO": "Pane",
        "TP_ESTACAO": "Automatica"
      },
      {
        "CD_ESTACAO": "A521",
        "DC_NOME": "BELO HORIZONTE (PAMPULHA)",
        "VL_LATITUDE": "-19.88398",
        "VL_LONGITUDE": "-43.969807",
        "SG_ESTADO": "MG",
        "CD_SITUACAO": "Operante",
        "TP_ESTACAO": "Automatica"
      }
    ]"#
}

/// Copacabana hourly data: rain at 13h (comma decimal) and 14h, 15h not
/// yet observed.
#[cfg(test)]
pub(crate) fn fixture_inmet_copacabana_data_json() -> &'static str {
    r#"[
      {
        "CD_ESTACAO": "A652",
        "DT_MEDICAO": "2024-01-01",
        "HR_MEDICAO": "1300",
        "CHUVA": "1,6",
        "TEM_INS": "27.1"
      },
      {
        "CD_ESTACAO": "A652",
        "DT_MEDICAO": "2024-01-01",
        "HR_MEDICAO": "1400",
        "CHUVA": 2.5,
        "TEM_INS": "26.4"
      },
      {
        "CD_ESTACAO": "A652",
        "DT_MEDICAO": "2024-01-01",
        "HR_MEDICAO": "1500",
        "CHUVA": null,
        "TEM_INS": null
      }
    ]"#
}

/// Legacy bulk payload for three gauges; Riocentro has no `read_at`.
#[cfg(test)]
pub(crate) fn fixture_legacy_json() -> &'static str {
    r#"{
      "objects": [
        {
          "name": "Tijuca",
          "read_at": "2024-01-01T14:00:00-03:00",
          "data": { "m15": 4.2, "h01": 55.0, "h02": 61.2, "h03": 62.0,
                    "h04": 63.4, "h24": 80.0, "h96": 120.0, "mes": 210.4 }
        },
        {
          "name": "Barra/Riocentro",
          "read_at": null,
          "data": { "m15": 0.0, "h01": 0.0, "h02": 0.0, "h03": 0.0,
                    "h04": 0.0, "h24": 150.0, "h96": 160.0, "mes": 300.0 }
        },
        {
          "name": "Est. Grajau/Jacarepagua",
          "read_at": "2024-01-01T14:00:00-03:00",
          "data": { "m15": "0.4", "h01": "1.0", "h02": "1.0", "h03": "1.0",
                    "h04": "1.0", "h24": "3.0", "h96": "3.0", "mes": "12.0" }
        }
      ]
    }"#
}
