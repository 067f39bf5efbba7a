/*!

This is the long-form manual for `share_tally` and `asmresults`.

## Ballot records

Each voter has one record in the ballot collection. The fields read by the tallies are:

| field                       | type    | meaning                                                   |
|-----------------------------|---------|-----------------------------------------------------------|
| `hasRatified`               | boolean | the voter went through the ratification step              |
| `hasVoted`                  | boolean | the voter submitted the ballot                            |
| `shares`                    | number  | shares held by the voter                                  |
| `maxVotes`                  | text    | maximum number of votes, stored as text (`"150"`)         |
| `vote1` ... `vote8`         | number  | votes given to each regular director                      |
| `independent1`, `independent2` | number | votes given to each independent director              |
| `selection1` ... `selection13` | text | `For`, `Against` or `Abstain`                          |

Only the records with both `hasRatified` and `hasVoted` set to `true` are counted.

Values that cannot be understood are not errors:
* a missing number counts as zero
* `maxVotes` is read with [crate::parse_integer], so `"abc"` counts as zero
* a selection that is not exactly `For`, `Against` or `Abstain` (the comparison is case-sensitive) is
  not counted at all, not even in the total of the resolution

## Input formats

The following formats are supported by `asmresults`:
* `firestore` the hosted collection itself, read through the Firestore REST interface
* `json` an export of the collection, either a list of objects or an object keyed by document id
* `csv` Comma Separated Values with a header row containing the field names
* `xlsx` an Excel spreadsheet with a header row containing the field names

### `firestore`

The documents of the collection are listed page by page. The sign-in of the administrator provides the
token used for the requests.

### `json`

```json
{
  "anna@example.com": { "hasRatified": true, "hasVoted": true, "shares": 100, "maxVotes": "10", "vote1": 5, "selection1": "For" },
  "bob@example.com": { "hasRatified": true, "hasVoted": false }
}
```

In the list form, the identifier is read from the `id` field, then the `email` field.

### `csv` and `xlsx`

The first row contains the field names. The identifier is read from the column named `id` unless
another column is given with `idColumn` in the configuration. In CSV files and in Excel text cells,
the text `true`/`false` (any case) is read as a boolean and numbers are detected automatically.
Identifiers are kept as written. When the same identifier appears more than once, in one source or
across several, only its last occurrence is counted.

With `--out stdout`, the JSON summary is the only output on stdout and the text view is printed on
stderr.

## Outputs

* a summary in JSON format, that can be compared with a reference summary (`--reference`)
* a plain text view of the directors and the resolutions in the terminal
* a static HTML page with both views (`--html`)
* a spreadsheet (`--xlsx`) and a PDF document (`--pdf`) when exports are enabled in the configuration

*/
