/// GTID 집합 비교 예제
///
/// source 서버와 replica 의 gtid_executed 를 환경 변수로 받아
/// replica 가 아직 적용하지 않은 트랜잭션을 출력합니다.
use gtid_set::{GtidSet, ParseConfig, ParseMode};
use std::env;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 초기화
    tracing_subscriber::fmt::init();

    let config = ParseConfig {
        mode: match env::var("GTID_PARSE_MODE").as_deref() {
            Ok("strict") => ParseMode::Strict,
            _ => ParseMode::Normalize,
        },
        ..Default::default()
    };

    let source_text = env::var("SOURCE_GTID_SET").unwrap_or_default();
    let replica_text = env::var("REPLICA_GTID_SET").unwrap_or_default();

    let source = GtidSet::parse_with(&source_text, &config)?;
    let replica = GtidSet::parse_with(&replica_text, &config)?;

    info!(
        "Source: {} transactions from {} servers",
        source.count(),
        source.len()
    );
    info!(
        "Replica: {} transactions from {} servers",
        replica.count(),
        replica.len()
    );

    // replica 에만 있는 트랜잭션은 errant transaction
    let errant = replica.difference(&source);
    if !errant.is_empty() {
        warn!(
            "Replica has {} errant transactions: {}",
            errant.count(),
            errant.to_compact_string()
        );
    }

    let missing = source.difference(&replica);
    if missing.is_empty() {
        info!("Replica is up to date");
    } else {
        info!("Replica is missing {} transactions", missing.count());
        println!("{}", missing);
    }

    Ok(())
}
