use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::llm::{ChatTurn, LlmClient};
use crate::models::packet;
use crate::models::pallet;
use crate::models::raw_pallet;
use crate::models::sizes;
use crate::nztime::{self, RangeUnit};
use async_openai::types::ChatCompletionResponseStream;
use chrono::{Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// Languages the assistant can answer in. English and Spanish carry the full
/// process briefing; the rest get a condensed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    Pt,
    Pa,
    Hi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Pt => "pt",
            Language::Pa => "pa",
            Language::Hi => "hi",
        }
    }

    /// An explicit request wins; otherwise the question's script and keywords
    /// decide, falling back to English.
    pub fn detect(text: &str, specified: Option<Language>) -> Language {
        if let Some(lang) = specified {
            return lang;
        }
        if text.chars().any(|c| ('\u{0A00}'..='\u{0A7F}').contains(&c)) {
            return Language::Pa;
        }
        if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
            return Language::Hi;
        }
        static ES: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(qué|cuántos|cómo|dónde|cuándo|por qué|hoy|ayer|mañana|paquetes)\b")
                .unwrap()
        });
        static FR: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(combien|comment|où|quand|pourquoi|aujourd'hui|hier|demain|palettes)\b")
                .unwrap()
        });
        static PT: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(quantos|onde|quando|por que|hoje|ontem|amanhã|pacotes|paletes)\b")
                .unwrap()
        });
        if ES.is_match(text) {
            Language::Es
        } else if FR.is_match(text) {
            Language::Fr
        } else if PT.is_match(text) {
            Language::Pt
        } else {
            Language::En
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Language::En => PROMPT_EN,
            Language::Es => PROMPT_ES,
            Language::Fr => PROMPT_FR,
            Language::Pt => PROMPT_PT,
            Language::Pa => PROMPT_PA,
            Language::Hi => PROMPT_HI,
        }
    }
}

const PROMPT_EN: &str = "You are the production assistant for a thermoforming factory in New \
Zealand.\n\
PROCESS:\n\
- Two thermoformers (TH1 and TH2).\n\
- Produced sizes are ONLY 22, 25, 27 and 30. Never mention 15 or 20.\n\
- A pallet holds up to 24 packets; each packet holds 432 plixies.\n\
- Shifts: DS (06:00-14:30), TW (14:30-23:00), NS (23:00-06:00).\n\
- All times are Pacific/Auckland civil time.\n\
DATA:\n\
- packets: iso_number (unique per size), size, thermoformer_number, shift, pallet_id, \
packet_index (1-24), created_at.\n\
- pallets: pallet_number (global sequence), size, thermoformer_number, opened_at, closed_at.\n\
- raw_pallets: supplier, pallet_no, batch_number, rolls_total (always 4), rolls_used.\n\
RULES:\n\
- ISO numbers restart per size; pallet numbers are global.\n\
- Answer in English, conversationally, using only the live data you are given.\n\
- Include concrete numbers; if the data cannot answer, say so plainly.";

const PROMPT_ES: &str = "Eres el asistente de producción de una fábrica de termoformado en \
Nueva Zelanda.\n\
PROCESO:\n\
- Dos termoformadoras (TH1 y TH2).\n\
- Los tamaños producidos son SOLO 22, 25, 27 y 30. Nunca menciones 15 ni 20.\n\
- Un pallet contiene hasta 24 packets; cada packet contiene 432 plixies.\n\
- Turnos: DS (06:00-14:30), TW (14:30-23:00), NS (23:00-06:00).\n\
- Todas las horas son hora civil de Pacific/Auckland.\n\
DATOS:\n\
- packets: iso_number (único por tamaño), size, thermoformer_number, shift, pallet_id, \
packet_index (1-24), created_at.\n\
- pallets: pallet_number (secuencia global), size, thermoformer_number, opened_at, closed_at.\n\
- raw_pallets: supplier, pallet_no, batch_number, rolls_total (siempre 4), rolls_used.\n\
REGLAS:\n\
- Los números ISO reinician por tamaño; los números de pallet son globales.\n\
- Responde en español, de forma conversacional, usando solo los datos en vivo que recibes.\n\
- Incluye números concretos; si los datos no alcanzan, dilo claramente.";

const PROMPT_FR: &str = "Vous êtes l'assistant de production d'une usine de thermoformage en \
Nouvelle-Zélande. Tailles produites: UNIQUEMENT 22, 25, 27, 30. Une palette contient jusqu'à 24 \
paquets. Équipes: DS (06:00-14:30), TW (14:30-23:00), NS (23:00-06:00), heure de \
Pacific/Auckland. Répondez en français avec les données réelles fournies; donnez des chiffres \
concrets et dites-le si les données manquent.";

const PROMPT_PT: &str = "Você é o assistente de produção de uma fábrica de termoformagem na \
Nova Zelândia. Tamanhos produzidos: APENAS 22, 25, 27, 30. Um palete contém até 24 pacotes. \
Turnos: DS (06:00-14:30), TW (14:30-23:00), NS (23:00-06:00), hora de Pacific/Auckland. \
Responda em português com os dados reais fornecidos; inclua números concretos e avise quando os \
dados não forem suficientes.";

const PROMPT_PA: &str = "ਤੁਸੀਂ ਨਿਊਜ਼ੀਲੈਂਡ ਦੀ ਇੱਕ ਥਰਮੋਫਾਰਮਿੰਗ ਫੈਕਟਰੀ ਦੇ ਉਤਪਾਦਨ ਸਹਾਇਕ ਹੋ। \
ਆਕਾਰ ਸਿਰਫ਼ 22, 25, 27, 30 ਹਨ। ਹਰ ਪੈਲੇਟ ਵਿੱਚ ਵੱਧ ਤੋਂ ਵੱਧ 24 ਪੈਕੇਟ ਹੁੰਦੇ ਹਨ। ਸ਼ਿਫਟਾਂ: DS \
(06:00-14:30), TW (14:30-23:00), NS (23:00-06:00)। ਪੰਜਾਬੀ ਵਿੱਚ, ਦਿੱਤੇ ਗਏ ਅਸਲ ਡੇਟਾ ਨਾਲ ਜਵਾਬ ਦਿਓ।";

const PROMPT_HI: &str = "आप न्यूज़ीलैंड की एक थर्मोफॉर्मिंग फैक्टरी के उत्पादन सहायक हैं। \
आकार केवल 22, 25, 27, 30 हैं। हर पैलेट में अधिकतम 24 पैकेट होते हैं। शिफ्ट: DS (06:00-14:30), \
TW (14:30-23:00), NS (23:00-06:00)। दिए गए वास्तविक डेटा के साथ हिंदी में उत्तर दें।";

/// An opened assistant reply stream plus the language it will answer in.
pub struct ChatStream {
    pub language: Language,
    pub stream: ChatCompletionResponseStream,
}

#[derive(Clone)]
pub struct ChatService {
    db_pool: Arc<DbPool>,
    llm: Option<LlmClient>,
}

impl ChatService {
    /// Without a model client the rule-based `/chat/query` path still works;
    /// only streaming replies need the upstream API.
    pub fn new(db_pool: Arc<DbPool>, llm: Option<LlmClient>) -> Self {
        Self { db_pool, llm }
    }

    /// Opens a streaming reply grounded in a live snapshot of production
    /// data. Chunks flow to the caller as the model emits them.
    #[instrument(skip(self, turns))]
    pub async fn stream_reply(
        &self,
        turns: &[ChatTurn],
        language: Option<Language>,
    ) -> Result<ChatStream, ServiceError> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            ServiceError::ExternalServiceError("assistant is not configured".to_string())
        })?;
        let last_user = turns
            .iter()
            .rev()
            .find(|t| t.role == "user")
            .ok_or_else(|| ServiceError::InvalidInput("no user message found".to_string()))?;
        let language = Language::detect(&last_user.content, language);

        let context = self.gather_context().await?;
        let system_prompt = format!(
            "{}\n\nLIVE PRODUCTION DATA (JSON):\n{}",
            language.system_prompt(),
            context
        );

        let stream = llm.stream_chat(&system_prompt, turns).await?;
        Ok(ChatStream { language, stream })
    }

    /// Snapshot of the data the assistant is allowed to quote.
    async fn gather_context(&self) -> Result<String, ServiceError> {
        let today = nztime::factory_range(RangeUnit::Day);
        let packets_today = packet::Entity::find()
            .filter(packet::Column::CreatedAt.gte(today.start))
            .filter(packet::Column::CreatedAt.lt(today.end))
            .count(&*self.db_pool)
            .await?;
        let open_pallets = pallet::Entity::find()
            .filter(pallet::Column::ClosedAt.is_null())
            .count(&*self.db_pool)
            .await?;
        let raw_pallet_count = raw_pallet::Entity::find().count(&*self.db_pool).await?;

        let recent_packets: Vec<serde_json::Value> = packet::Entity::find()
            .order_by_desc(packet::Column::CreatedAt)
            .limit(10)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|p| {
                json!({
                    "iso_number": p.iso_number,
                    "size": p.size,
                    "thermoformer_number": p.thermoformer_number,
                    "shift": p.shift.code(),
                    "packet_index": p.packet_index,
                    "created_at": p.created_at,
                })
            })
            .collect();

        let recent_pallets: Vec<serde_json::Value> = pallet::Entity::find()
            .order_by_desc(pallet::Column::OpenedAt)
            .limit(10)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|p| {
                json!({
                    "pallet_number": p.pallet_number,
                    "size": p.size,
                    "thermoformer_number": p.thermoformer_number,
                    "opened_at": p.opened_at,
                    "closed_at": p.closed_at,
                })
            })
            .collect();

        let recent_raw_pallets: Vec<serde_json::Value> = raw_pallet::Entity::find()
            .order_by_desc(raw_pallet::Column::CreatedAt)
            .limit(10)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|p| {
                json!({
                    "supplier": p.supplier,
                    "pallet_no": p.pallet_no,
                    "batch_number": p.batch_number,
                    "rolls_total": p.rolls_total,
                    "rolls_used": p.rolls_used,
                })
            })
            .collect();

        let week_ago = Utc::now() - Duration::days(7);
        let week_packets = packet::Entity::find()
            .filter(packet::Column::CreatedAt.gte(week_ago))
            .all(&*self.db_pool)
            .await?;
        let mut by_size: BTreeMap<i32, u64> = BTreeMap::new();
        for p in week_packets {
            *by_size.entry(p.size).or_default() += 1;
        }

        let context = json!({
            "stats": {
                "packets_today": packets_today,
                "open_pallets": open_pallets,
                "raw_pallets": raw_pallet_count,
            },
            "recent_packets": recent_packets,
            "recent_pallets": recent_pallets,
            "recent_raw_pallets": recent_raw_pallets,
            "packets_last_7_days_by_size": by_size,
            "available_sizes": sizes::ALL_SIZES,
            "current_time_utc": Utc::now(),
            "timezone": "Pacific/Auckland (New Zealand)",
        });
        serde_json::to_string(&context)
            .map_err(|e| ServiceError::InternalError(format!("context serialization: {}", e)))
    }

    /// Answers counting questions straight from the database, no model
    /// involved. Understands English and Spanish phrasings.
    #[instrument(skip(self))]
    pub async fn answer_query(&self, question: &str) -> Result<String, ServiceError> {
        let text = question.to_lowercase();
        let today = Utc::now().with_timezone(&nztime::FACTORY_TZ).date_naive();

        static TODAY: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(^|\s)(hoy|today)(\s|$)").unwrap());
        static YESTERDAY: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(^|\s)(ayer|yesterday)(\s|$)").unwrap());
        static DAYS_AGO: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"hace\s+(\d+)\s+d[ií]as|(\d+)\s+days?\s+ago").unwrap());
        static THIS_WEEK: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"esta\s+semana|this\s+week").unwrap());
        static THIS_MONTH: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"este\s+mes|this\s+month").unwrap());
        static BETWEEN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"(?:entre|between)\s+(\d{4}-\d{2}-\d{2})\s+(?:y|and)\s+(\d{4}-\d{2}-\d{2})",
            )
            .unwrap()
        });

        let spanish = Language::detect(&text, None) == Language::Es;

        if TODAY.is_match(&text) {
            let count = self
                .count_packets(nztime::day_range_utc(nztime::FACTORY_TZ, today))
                .await?;
            return Ok(if spanish {
                format!("Hoy se registraron {} paquetes.", count)
            } else {
                format!("{} packets were recorded today.", count)
            });
        }

        if YESTERDAY.is_match(&text) {
            let count = self
                .count_packets(nztime::day_range_utc(
                    nztime::FACTORY_TZ,
                    today - Duration::days(1),
                ))
                .await?;
            return Ok(if spanish {
                format!("Ayer se registraron {} paquetes.", count)
            } else {
                format!("{} packets were recorded yesterday.", count)
            });
        }

        if let Some(caps) = DAYS_AGO.captures(&text) {
            let n: i64 = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(|| {
                    ServiceError::InvalidInput("could not read the day count".to_string())
                })?;
            // Absurd counts overflow chrono; reject instead of panicking.
            let date = Duration::try_days(n)
                .and_then(|delta| today.checked_sub_signed(delta))
                .ok_or_else(|| {
                    ServiceError::InvalidInput("day count is out of range".to_string())
                })?;
            let count = self
                .count_packets(nztime::day_range_utc(nztime::FACTORY_TZ, date))
                .await?;
            return Ok(if spanish {
                format!("Hace {} día(s) se registraron {} paquetes.", n, count)
            } else {
                format!("{} packets were recorded {} day(s) ago.", count, n)
            });
        }

        if THIS_WEEK.is_match(&text) {
            let count = self
                .count_packets(nztime::factory_range(RangeUnit::Week))
                .await?;
            return Ok(if spanish {
                format!("Esta semana llevamos {} paquetes.", count)
            } else {
                format!("{} packets so far this week.", count)
            });
        }

        if THIS_MONTH.is_match(&text) {
            let count = self
                .count_packets(nztime::factory_range(RangeUnit::Month))
                .await?;
            return Ok(if spanish {
                format!("Este mes llevamos {} paquetes.", count)
            } else {
                format!("{} packets so far this month.", count)
            });
        }

        if let Some(caps) = BETWEEN.captures(&text) {
            let parse = |m: &regex::Match| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d");
            let (first, last) = match (caps.get(1), caps.get(2)) {
                (Some(a), Some(b)) => (
                    parse(&a).map_err(|_| {
                        ServiceError::InvalidInput("invalid start date".to_string())
                    })?,
                    parse(&b)
                        .map_err(|_| ServiceError::InvalidInput("invalid end date".to_string()))?,
                ),
                _ => {
                    return Err(ServiceError::InvalidInput(
                        "could not read the date range".to_string(),
                    ))
                }
            };
            if last < first {
                return Err(ServiceError::InvalidInput(
                    "end date precedes start date".to_string(),
                ));
            }
            let count = self
                .count_packets(nztime::days_range_utc(nztime::FACTORY_TZ, first, last))
                .await?;
            return Ok(if spanish {
                format!(
                    "Entre {} y {} se registraron {} paquetes.",
                    first, last, count
                )
            } else {
                format!(
                    "{} packets were recorded between {} and {}.",
                    count, first, last
                )
            });
        }

        Ok(if spanish {
            "Pregunta entendida, pero aún no la soportamos. Prueba con: 'hoy', 'ayer', \
             'hace 3 días', 'esta semana', 'este mes', o 'entre YYYY-MM-DD y YYYY-MM-DD'."
                .to_string()
        } else {
            "Understood, but that question is not supported yet. Try: 'today', 'yesterday', \
             '3 days ago', 'this week', 'this month', or 'between YYYY-MM-DD and YYYY-MM-DD'."
                .to_string()
        })
    }

    async fn count_packets(&self, range: nztime::LocalRange) -> Result<u64, ServiceError> {
        let count = packet::Entity::find()
            .filter(packet::Column::CreatedAt.gte(range.start))
            .filter(packet::Column::CreatedAt.lt(range.end))
            .count(&*self.db_pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_language_wins_over_detection() {
        assert_eq!(
            Language::detect("¿cuántos paquetes hoy?", Some(Language::En)),
            Language::En
        );
    }

    #[tokio::test]
    async fn absurd_day_counts_are_rejected_without_panicking() {
        let svc = ChatService::new(Arc::new(sea_orm::DatabaseConnection::Disconnected), None);
        let err = svc
            .answer_query("how many packets 9000000000000000000 days ago")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = svc
            .answer_query("paquetes hace 9000000000000000000 días")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn detects_by_script_and_keywords() {
        assert_eq!(Language::detect("ਅੱਜ ਕਿੰਨੇ ਪੈਕੇਟ?", None), Language::Pa);
        assert_eq!(Language::detect("आज कितने पैकेट?", None), Language::Hi);
        assert_eq!(Language::detect("¿cuántos paquetes hay hoy?", None), Language::Es);
        assert_eq!(Language::detect("combien de palettes?", None), Language::Fr);
        assert_eq!(Language::detect("quantos pacotes hoje?", None), Language::Pt);
        assert_eq!(Language::detect("how many packets today?", None), Language::En);
        assert_eq!(Language::detect("zzz", None), Language::En);
    }
}
