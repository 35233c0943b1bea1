use criterion::{Criterion, black_box, criterion_group, criterion_main};

use lostfound_auth::{Role, Subject, TokenService, TokenVerifier};
use lostfound_core::UserId;

fn bench_tokens(c: &mut Criterion) {
    let svc = TokenService::with_default_ttl(b"bench-secret");
    let subject = Subject::new(UserId::new(), "bench@campus.edu", Role::Student);
    let token = svc.issue(&subject).unwrap();

    c.bench_function("token_issue", |b| b.iter(|| svc.issue(black_box(&subject)).unwrap()));
    c.bench_function("token_verify", |b| b.iter(|| svc.verify(black_box(&token)).unwrap()));
}

criterion_group!(benches, bench_tokens);
criterion_main!(benches);
