//! 변환 trait -- 로그 소스별 확장 포인트 정의

use crate::error::TransformError;
use crate::record::Record;

/// 로그 소스별 레코드 변환 trait
///
/// 새로운 로그 소스를 표준 스키마로 매핑하려면 이 trait을 구현합니다.
/// 구현체는 호출 간 상태를 갖지 않아야 하며, 전달받은 레코드만 변경합니다.
pub trait LogTransform: Send + Sync {
    /// 지원하는 로그 소스 이름
    fn source_name(&self) -> &str;

    /// 레코드를 제자리에서 변환하고 같은 레코드를 반환합니다.
    ///
    /// `Err(TransformError::Format)`은 "레코드 건너뛰기" 신호입니다.
    fn transform<'r>(&self, record: &'r mut Record) -> Result<&'r mut Record, TransformError>;
}
