/*!

# Quick start

This example runs the tabulation end to end from a local export of the ballot collection.

Write the list of candidates and resolutions of the meeting in a configuration file `meeting.json`.
The file `config/asm2025.json` in the repository is the complete configuration of a meeting that
reads the hosted collection. For a local export:

```json
{
  "meetingSettings": { "organizationName": "Premier Medical Center Zamboanga", "meetingTitle": "2025 Annual Stockholders' Meeting" },
  "admin": { "email": "admin@example.com", "provider": "local", "passwordSha256": "..." },
  "recordSources": [ { "provider": "json", "filePath": "ballots.json" } ],
  "candidates": [ { "key": "vote1", "name": "Ong, Romeo A.", "category": "regular" } ],
  "resolutions": [ { "number": "01", "title": "Approval of the Minutes" } ],
  "features": { "statisticsCards": true, "exportButtons": true }
}
```

The digest of the password is the SHA-256 of the password text, in hexadecimal:

```bash
printf '%s' 'my password' | sha256sum
```

Run `asmresults` with the following command:

```bash
ASM_ADMIN_PASSWORD='my password' asmresults -c meeting.json \
  --email admin@example.com --xlsx results.xlsx --pdf results.pdf
```

After running this command, you should see the outcome of the meeting:

```text
[2025-01-26T09:55:59Z INFO  asmresults::dashboard] Total documents fetched: 3
[2025-01-26T09:55:59Z INFO  share_tally] aggregate: eligible voters: 2
Premier Medical Center Zamboanga
2025 Annual Stockholders' Meeting
VOTING RESULTS
AS OF 01/26/2025 9:55AM
```

followed by the director tallies and the resolution tallies.

Using the library directly only requires the records:

```
use share_tally::{aggregate, VoterRecord, DEFAULT_CANDIDATE_KEYS, DEFAULT_RESOLUTION_COUNT};

let keys: Vec<String> = DEFAULT_CANDIDATE_KEYS.iter().map(|s| s.to_string()).collect();
let records = vec![VoterRecord::new("anna@example.com")
    .ratified(true)
    .voted(true)
    .shares(100)
    .max_votes("10")];
let result = aggregate(&records, &keys, DEFAULT_RESOLUTION_COUNT);
assert_eq!(result.total_max_votes, 10);
```

*/
